//! Session orchestration for the spatial audio engine
//!
//! [`SpatialAudioManager`] owns the participant registry, the active
//! panning strategy and the event bus. [`SpatialAudioHandler`] drives a
//! manager from an async command channel.

pub mod events;
pub mod handler;
pub mod manager;
pub mod registry;

pub use events::{EventBus, EventHandler, ListenerId};
pub use handler::{SpatialAudioHandler, SpatialCommand};
pub use manager::SpatialAudioManager;
pub use registry::ParticipantRegistry;
