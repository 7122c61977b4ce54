//! Core types for the spatial audio engine
//!
//! This crate holds the data model shared by every other crate:
//! positions, listener orientation, panning selection, participant
//! audio data, process-wide settings and the unified error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod events;

// Re-export commonly used types from events
pub use events::{
    EventKind, EventPayload, ParticipantAdded, ParticipantMoved, ParticipantRemoved,
    SettingsUpdated, SpatialEvent, StrategyChanged,
};

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio graph error: {0}")]
    Graph(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error), // Catch-all for other errors
}

/// Identifier of a node inside the host audio graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Opaque handle to a participant's audio-producing node.
///
/// The engine never looks inside a source; it only connects it into and
/// disconnects it from the nodes a panning strategy owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(NodeId);

impl SourceHandle {
    pub const fn new(node: NodeId) -> Self {
        Self(node)
    }

    pub const fn node(self) -> NodeId {
        self.0
    }
}

/// Cartesian offset from the listener origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Position {
    pub const ORIGIN: Position = Position::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// A position without a depth component.
    pub const fn flat(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    pub fn z_or_zero(&self) -> f32 {
        self.z.unwrap_or(0.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z_or_zero())
    }
}

/// Listener orientation as forward and up vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenerOrientation {
    pub forward: Position,
    pub up: Position,
}

impl ListenerOrientation {
    /// Forward vector with a missing `z` resolved to -1.
    pub fn forward_vector(&self) -> (f32, f32, f32) {
        (
            self.forward.x,
            self.forward.y,
            self.forward.z.unwrap_or(-1.0),
        )
    }

    /// Up vector with a missing `z` resolved to 1.
    pub fn up_vector(&self) -> (f32, f32, f32) {
        (self.up.x, self.up.y, self.up.z.unwrap_or(1.0))
    }
}

impl Default for ListenerOrientation {
    fn default() -> Self {
        Self {
            forward: Position::new(0.0, 0.0, -1.0),
            up: Position::new(0.0, 1.0, 0.0),
        }
    }
}

/// Panning algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanningType {
    /// Mono passthrough, no spatial cue
    #[default]
    None,
    /// Linear left/right stereo pan
    Stereo,
    /// Equal-power 3D panner
    #[serde(rename = "equalpower")]
    EqualPower,
    /// Head-related transfer function 3D panner
    Hrtf,
}

impl PanningType {
    pub const ALL: [PanningType; 4] = [
        PanningType::None,
        PanningType::Stereo,
        PanningType::EqualPower,
        PanningType::Hrtf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PanningType::None => "none",
            PanningType::Stereo => "stereo",
            PanningType::EqualPower => "equalpower",
            PanningType::Hrtf => "hrtf",
        }
    }
}

impl fmt::Display for PanningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanningType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "mono" => Ok(PanningType::None),
            "stereo" => Ok(PanningType::Stereo),
            "equalpower" | "equal-power" => Ok(PanningType::EqualPower),
            "hrtf" => Ok(PanningType::Hrtf),
            other => Err(Error::Config(format!("Unknown panning type: {}", other))),
        }
    }
}

/// Process-wide spatial audio settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialAudioSettings {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: PanningType,
    /// Master volume in `[0, 1]`
    pub master_volume: f32,
    pub listener_position: Position,
    pub listener_orientation: ListenerOrientation,
}

pub const DEFAULT_MASTER_VOLUME: f32 = 0.6;

impl Default for SpatialAudioSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: PanningType::None,
            master_volume: DEFAULT_MASTER_VOLUME,
            listener_position: Position::ORIGIN,
            listener_orientation: ListenerOrientation::default(),
        }
    }
}

/// Clamp a volume into `[0, 1]`, logging when the input was out of range.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        log::warn!("Master volume is NaN, using 0");
        return 0.0;
    }
    let clamped = volume.clamp(0.0, 1.0);
    if clamped != volume {
        log::warn!("Master volume {} out of range, clamped to {}", volume, clamped);
    }
    clamped
}

/// Partial settings used for merges. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<PanningType>,
    pub master_volume: Option<f32>,
    pub listener_position: Option<Position>,
    pub listener_orientation: Option<ListenerOrientation>,
}

impl SettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn panning(mut self, kind: PanningType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn master_volume(mut self, volume: f32) -> Self {
        self.master_volume = Some(volume);
        self
    }

    pub fn listener_position(mut self, position: Position) -> Self {
        self.listener_position = Some(position);
        self
    }

    pub fn listener_orientation(mut self, orientation: ListenerOrientation) -> Self {
        self.listener_orientation = Some(orientation);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Audio data the registry keeps for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantAudioData {
    pub participant_id: String,
    pub display_name: Option<String>,
    pub is_local: bool,
    pub is_muted: bool,
    /// Ordinal used for layout assignment
    pub track_index: usize,
    pub position: Position,
    pub source: Option<SourceHandle>,
}

impl ParticipantAudioData {
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }
}

/// Input for adding a participant: everything except the position,
/// which the engine computes.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParticipant {
    pub participant_id: String,
    pub display_name: Option<String>,
    pub is_local: bool,
    pub is_muted: bool,
    pub track_index: usize,
    pub source: Option<SourceHandle>,
}

impl NewParticipant {
    pub fn new(participant_id: impl Into<String>, track_index: usize) -> Self {
        Self {
            participant_id: participant_id.into(),
            display_name: None,
            is_local: false,
            is_muted: false,
            track_index,
            source: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_source(mut self, source: SourceHandle) -> Self {
        self.source = Some(source);
        self
    }

    pub fn muted(mut self, is_muted: bool) -> Self {
        self.is_muted = is_muted;
        self
    }

    pub fn into_audio_data(self, position: Position) -> ParticipantAudioData {
        ParticipantAudioData {
            participant_id: self.participant_id,
            display_name: self.display_name,
            is_local: self.is_local,
            is_muted: self.is_muted,
            track_index: self.track_index,
            position,
            source: self.source,
        }
    }
}
