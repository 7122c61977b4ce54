use super::LayoutStrategy;
use log::warn;
use spatial_core::Position;

/// Seats at -45°, -15°, +15° and +45° in front of the listener.
const FOUR_SEATS: [Position; 4] = [
    Position::new(-0.495, 0.0, -0.495),
    Position::new(-0.181, 0.0, -0.676),
    Position::new(0.181, 0.0, -0.676),
    Position::new(0.495, 0.0, -0.495),
];

/// Same azimuths on an upper and a lower tier.
const EIGHT_SEATS: [Position; 8] = [
    Position::new(-0.495, 1.0, -0.495),
    Position::new(-0.181, 1.0, -0.676),
    Position::new(0.181, 1.0, -0.676),
    Position::new(0.495, 1.0, -0.495),
    Position::new(-0.495, -1.0, -0.495),
    Position::new(-0.181, -1.0, -0.676),
    Position::new(0.181, -1.0, -0.676),
    Position::new(0.495, -1.0, -0.495),
];

const AZIMUTH_DEGREES: [f32; 4] = [-45.0, -15.0, 15.0, 45.0];

/// Table-driven layout for up to eight participants. Larger rooms reuse
/// the eight-seat table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAzimuthLayout;

impl FixedAzimuthLayout {
    pub const MAX_SEATS: usize = EIGHT_SEATS.len();

    pub fn new() -> Self {
        Self
    }

    /// Azimuth in degrees of the seat at `index`, ignoring the tier.
    pub fn azimuth_for_index(&self, index: usize) -> f32 {
        AZIMUTH_DEGREES[index % AZIMUTH_DEGREES.len()]
    }

    /// Azimuths in degrees for each seat used by `count` participants.
    pub fn azimuth_angles(&self, count: usize) -> Vec<f32> {
        AZIMUTH_DEGREES
            .iter()
            .chain(AZIMUTH_DEGREES.iter())
            .take(count.min(Self::MAX_SEATS))
            .copied()
            .collect()
    }
}

impl LayoutStrategy for FixedAzimuthLayout {
    fn calculate_positions(&self, count: usize) -> Vec<Position> {
        if count <= FOUR_SEATS.len() {
            FOUR_SEATS[..count].to_vec()
        } else if count <= EIGHT_SEATS.len() {
            EIGHT_SEATS[..count].to_vec()
        } else {
            warn!(
                "Fixed azimuth layout supports at most {} participants, using the {}-seat layout for {}",
                Self::MAX_SEATS,
                Self::MAX_SEATS,
                count
            );
            EIGHT_SEATS.to_vec()
        }
    }

    fn position_for_index(&self, index: usize, total: usize) -> Position {
        let positions = self.calculate_positions(total);

        match positions.get(index) {
            Some(position) => *position,
            None => {
                warn!(
                    "Fixed azimuth layout: index {} out of range for {} participants",
                    index, total
                );
                positions.last().copied().unwrap_or(Position::ORIGIN)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_participants_use_single_tier() {
        let layout = FixedAzimuthLayout::new();
        assert_eq!(layout.calculate_positions(4), FOUR_SEATS.to_vec());
    }

    #[test]
    fn small_counts_take_table_prefix() {
        let layout = FixedAzimuthLayout::new();
        assert!(layout.calculate_positions(0).is_empty());
        assert_eq!(layout.calculate_positions(2), FOUR_SEATS[..2].to_vec());
        assert_eq!(layout.calculate_positions(6), EIGHT_SEATS[..6].to_vec());
    }

    #[test_log::test]
    fn overflow_degrades_to_eight_seats() {
        let layout = FixedAzimuthLayout::new();
        assert_eq!(layout.calculate_positions(9), EIGHT_SEATS.to_vec());
        assert_eq!(layout.calculate_positions(20).len(), 8);
    }

    #[test]
    fn out_of_range_index_returns_last_seat() {
        let layout = FixedAzimuthLayout::new();
        assert_eq!(layout.position_for_index(1, 2), FOUR_SEATS[1]);
        assert_eq!(layout.position_for_index(5, 2), FOUR_SEATS[1]);
        assert_eq!(layout.position_for_index(0, 0), Position::ORIGIN);
    }

    #[test]
    fn azimuth_table() {
        let layout = FixedAzimuthLayout::new();
        assert_eq!(layout.azimuth_for_index(0), -45.0);
        assert_eq!(layout.azimuth_for_index(6), 15.0);
        assert_eq!(layout.azimuth_angles(3), vec![-45.0, -15.0, 15.0]);
        assert_eq!(
            layout.azimuth_angles(6),
            vec![-45.0, -15.0, 15.0, 45.0, -45.0, -15.0]
        );
        assert_eq!(layout.azimuth_angles(12).len(), 8);
    }

    #[test]
    fn seats_sit_on_the_listener_side() {
        for position in EIGHT_SEATS {
            assert!(position.z_or_zero() < 0.0);
        }
    }
}
