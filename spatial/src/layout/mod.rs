//! Layout strategies: participant count to positions.

use serde::{Deserialize, Serialize};
use spatial_core::{Error, Position};
use std::fmt;
use std::str::FromStr;

mod fixed_azimuth;
mod grid;

pub use fixed_azimuth::FixedAzimuthLayout;
pub use grid::GridLayout;

/// Maps participant counts and indices to positions. Implementations are
/// stateless.
pub trait LayoutStrategy: Send {
    /// Positions for `count` participants, in seat order.
    fn calculate_positions(&self, count: usize) -> Vec<Position>;

    fn position_for_index(&self, index: usize, total: usize) -> Position;
}

/// Selects which layout strategy a manager uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    #[default]
    FixedAzimuth,
    Grid,
}

impl LayoutKind {
    pub fn create(self) -> Box<dyn LayoutStrategy> {
        match self {
            LayoutKind::FixedAzimuth => Box::new(FixedAzimuthLayout::new()),
            LayoutKind::Grid => Box::new(GridLayout::new()),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutKind::FixedAzimuth => write!(f, "fixed_azimuth"),
            LayoutKind::Grid => write!(f, "grid"),
        }
    }
}

impl FromStr for LayoutKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fixed_azimuth" | "azimuth" => Ok(LayoutKind::FixedAzimuth),
            "grid" => Ok(LayoutKind::Grid),
            other => Err(Error::Config(format!("Unknown layout: {}", other))),
        }
    }
}
