//! Spatial audio mixing engine for small conference rooms
//!
//! Places each remote participant at a virtual seat around the listener and
//! renders their audio through one of four panning strategies. The engine
//! drives an [`AudioGraph`] supplied by the host; [`MemoryGraph`] is an
//! in-memory graph for tests and headless use.

mod engine;

pub use engine::SpatialAudioEngine;

// Re-export commonly used types for convenience
pub use audio_graph::{AudioGraph, DeviceState, GraphError, MemoryGraph};
pub use mixer::{EventBus, ListenerId, SpatialAudioHandler, SpatialAudioManager, SpatialCommand};
pub use settings_manager::EngineConfig;
pub use spatial::{LayoutKind, LayoutStrategy, PanningStrategy};
pub use spatial_core::{
    Error, EventKind, ListenerOrientation, NewParticipant, NodeId, PanningType,
    ParticipantAudioData, Position, SettingsUpdate, SourceHandle, SpatialAudioSettings,
    SpatialEvent,
};
