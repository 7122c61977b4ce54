//! Spatial placement and panning for the spatial audio engine
//!
//! Layout strategies map a participant count to positions around the
//! listener. Panning strategies own the per-participant node chains in
//! the host [`audio_graph::AudioGraph`] and turn positions into panner
//! parameters.

pub mod layout;
pub mod panning;

pub use layout::{FixedAzimuthLayout, GridLayout, LayoutKind, LayoutStrategy};
pub use panning::{
    create_strategy, ListenerControl, NodeChainStrategy, Panner3d, PanningAlgorithm,
    PanningStrategy, ParticipantNodes, Passthrough, StereoPan,
};
