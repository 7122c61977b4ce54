//! Audio graph abstraction for the spatial audio engine
//!
//! The engine never talks to an audio API directly. Hosts implement
//! [`AudioGraph`] over whatever backend they run (a browser audio context,
//! a native mixer, ...). [`MemoryGraph`] is an in-memory implementation
//! that records every node and connection, used by tests and headless hosts.

use spatial_core::{Error, ListenerOrientation, NodeId, Position};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

mod memory;

pub use memory::{MemoryGraph, NodeKind, NodeState};

/// Errors raised by an audio graph backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Audio graph is closed")]
    Closed,

    #[error("Failed to resume output device: {0}")]
    ResumeFailed(String),

    #[error("Unsupported node operation: {0}")]
    UnsupportedNode(String),
}

impl From<GraphError> for Error {
    fn from(error: GraphError) -> Self {
        Error::Graph(error.to_string())
    }
}

/// State of the output device behind the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Running,
    Suspended,
    Closed,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceState::Running => write!(f, "running"),
            DeviceState::Suspended => write!(f, "suspended"),
            DeviceState::Closed => write!(f, "closed"),
        }
    }
}

/// Panning model of a 3D panner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanningModel {
    EqualPower,
    Hrtf,
}

/// Distance attenuation model of a 3D panner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceModel {
    /// No attenuation; azimuth is the only cue
    None,
    Linear,
    Inverse,
    Exponential,
}

/// Static configuration of a 3D panner node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PannerConfig {
    pub panning_model: PanningModel,
    pub distance_model: DistanceModel,
    pub ref_distance: f32,
    pub max_distance: f32,
    pub rolloff_factor: f32,
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
    pub orientation: (f32, f32, f32),
}

impl PannerConfig {
    /// Panner with distance attenuation disabled and an omnidirectional cone.
    pub fn flat_rolloff(panning_model: PanningModel) -> Self {
        Self {
            panning_model,
            distance_model: DistanceModel::None,
            ref_distance: 0.7,
            max_distance: 10_000.0,
            rolloff_factor: 0.0,
            cone_inner_angle: 360.0,
            cone_outer_angle: 360.0,
            cone_outer_gain: 1.0,
            orientation: (0.0, 0.0, -1.0),
        }
    }
}

/// Future returned by [`AudioGraph::resume`]. It owns everything it needs so
/// callers can hand it to an executor and forget about it.
pub type ResumeFuture = Pin<Box<dyn Future<Output = Result<(), GraphError>> + Send + 'static>>;

/// Host audio graph the engine builds per-participant node chains in.
///
/// All operations are synchronous and O(1) per node except [`resume`],
/// which hands back a future.
///
/// [`resume`]: AudioGraph::resume
pub trait AudioGraph: Send {
    fn state(&self) -> DeviceState;

    /// Final output node of the graph
    fn destination(&self) -> NodeId;

    fn create_gain_node(&mut self) -> Result<NodeId, GraphError>;

    fn create_stereo_panner_node(&mut self) -> Result<NodeId, GraphError>;

    fn create_panner_node(&mut self, config: &PannerConfig) -> Result<NodeId, GraphError>;

    fn set_gain(&mut self, node: NodeId, value: f32) -> Result<(), GraphError>;

    /// Linearly ramp a gain from its current value to `target`.
    fn ramp_gain(&mut self, node: NodeId, target: f32, duration: Duration)
        -> Result<(), GraphError>;

    fn set_pan(&mut self, node: NodeId, pan: f32) -> Result<(), GraphError>;

    fn set_panner_position(&mut self, node: NodeId, position: Position)
        -> Result<(), GraphError>;

    fn set_listener(
        &mut self,
        position: Position,
        orientation: ListenerOrientation,
    ) -> Result<(), GraphError>;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError>;

    /// Remove every outgoing connection of `node`.
    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Drop a node together with every connection touching it.
    fn release(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Begin resuming a suspended output device.
    fn resume(&mut self) -> ResumeFuture;

    fn close(&mut self) -> Result<(), GraphError>;
}
