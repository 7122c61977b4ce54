use super::LayoutStrategy;
use spatial_core::Position;

const ROW_HALF_WIDTH: f32 = 2.0;

/// Row-banded layout: seats spread evenly across `[-2, 2]` on one to three
/// rows depending on the room size.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout;

impl GridLayout {
    pub fn new() -> Self {
        Self
    }
}

/// Evenly spaced x for seat `index` of a row holding `seats` participants.
fn row_x(index: usize, seats: usize) -> f32 {
    if seats > 1 {
        (index as f32 / (seats - 1) as f32) * (2.0 * ROW_HALF_WIDTH) - ROW_HALF_WIDTH
    } else {
        0.0
    }
}

impl LayoutStrategy for GridLayout {
    fn calculate_positions(&self, count: usize) -> Vec<Position> {
        (0..count)
            .map(|index| self.position_for_index(index, count))
            .collect()
    }

    fn position_for_index(&self, index: usize, total: usize) -> Position {
        let (x, y) = match total {
            0..=4 => (row_x(index, total), 0.0),
            5..=8 => {
                let per_row = total.div_ceil(2);
                let row = index / per_row;
                let seats = if row == 0 { per_row } else { total - per_row };
                let y = if row == 0 { 1.0 } else { -1.0 };
                (row_x(index % per_row, seats), y)
            }
            9..=12 => {
                let per_row = total.div_ceil(3);
                let row = index / per_row;
                let seats = match row {
                    0 => per_row.min(total),
                    1 => per_row.min(total.saturating_sub(per_row)),
                    _ => total.saturating_sub(2 * per_row),
                };
                let y = match row {
                    0 => 1.5,
                    1 => 0.0,
                    _ => -1.5,
                };
                (row_x(index % per_row, seats), y)
            }
            // Beyond twelve everyone shares a single row
            _ => (row_x(index, total), 0.0),
        };

        Position::new(x, y, 0.0)
    }
}
