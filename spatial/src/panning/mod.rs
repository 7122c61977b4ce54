//! Panning strategies: per-participant node chains in the audio graph.
//!
//! Every strategy shares the same bookkeeping ([`NodeChainStrategy`]) and
//! differs only in the [`PanningAlgorithm`] that builds the panner stage and
//! maps a position onto it.

use audio_graph::{AudioGraph, GraphError};
use spatial_core::{Error, NodeId, PanningType, Position, SourceHandle, SpatialAudioSettings};

mod chain;
mod panner3d;
mod passthrough;
mod stereo;

pub use chain::{NodeChainStrategy, ParticipantNodes};
pub use panner3d::Panner3d;
pub use passthrough::Passthrough;
pub use stereo::StereoPan;

/// Contract every panning strategy fulfils. A strategy instance is bound to
/// one algorithm for its whole life and owns the nodes it creates.
pub trait PanningStrategy: Send {
    fn kind(&self) -> PanningType;

    /// Allocate and wire this participant's chain. Calling it again for a
    /// participant that already has a chain returns the existing nodes.
    fn create_nodes(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
        settings: &SpatialAudioSettings,
    ) -> Result<Vec<NodeId>, Error>;

    fn update_position(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
        position: Position,
    ) -> Result<(), Error>;

    /// Wire `source` into the participant's chain, cutting any connection the
    /// source had before.
    fn connect_source(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
        source: SourceHandle,
    ) -> Result<(), Error>;

    /// Release the participant's chain. Idempotent.
    fn disconnect_participant(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
    ) -> Result<(), Error>;

    /// Node a participant's source connects into
    fn input_node(&self, participant_id: &str) -> Option<NodeId>;

    /// Last node of the participant's chain before the destination
    fn output_node(&self, participant_id: &str) -> Option<NodeId>;

    /// Number of participants that currently own a chain
    fn chain_count(&self) -> usize;

    /// Release every chain this strategy owns.
    fn destroy(&mut self, graph: &mut dyn AudioGraph) -> Result<(), Error>;

    /// Global listener/volume capability, if the strategy has one.
    fn listener_control(&mut self) -> Option<&mut dyn ListenerControl> {
        None
    }
}

/// Capability of strategies that react to global settings changes.
pub trait ListenerControl {
    /// Push listener position, orientation and master volume to every live chain.
    fn update_global_settings(
        &mut self,
        graph: &mut dyn AudioGraph,
        settings: &SpatialAudioSettings,
    ) -> Result<(), Error>;
}

/// The part of a strategy that varies between algorithms.
pub trait PanningAlgorithm: Send + 'static {
    fn kind(&self) -> PanningType;

    /// One-time graph setup when the strategy is constructed.
    fn initialize(&mut self, _graph: &mut dyn AudioGraph) -> Result<(), GraphError> {
        Ok(())
    }

    /// Create the panner stage, or `None` for algorithms without one.
    fn create_panner(&self, graph: &mut dyn AudioGraph) -> Result<Option<NodeId>, GraphError>;

    /// Gain applied to a freshly created chain.
    fn apply_initial_volume(
        &self,
        graph: &mut dyn AudioGraph,
        gain: NodeId,
        volume: f32,
    ) -> Result<(), GraphError> {
        graph.set_gain(gain, volume)
    }

    /// Gain applied on a global settings change.
    fn apply_volume(
        &self,
        graph: &mut dyn AudioGraph,
        gain: NodeId,
        volume: f32,
    ) -> Result<(), GraphError> {
        graph.set_gain(gain, volume)
    }

    fn apply_position(
        &self,
        graph: &mut dyn AudioGraph,
        nodes: &ParticipantNodes,
        position: Position,
    ) -> Result<(), GraphError>;

    fn apply_listener(
        &self,
        _graph: &mut dyn AudioGraph,
        _settings: &SpatialAudioSettings,
    ) -> Result<(), GraphError> {
        Ok(())
    }
}

/// Build the strategy for `kind`, running its one-time graph setup.
pub fn create_strategy(kind: PanningType, graph: &mut dyn AudioGraph) -> Box<dyn PanningStrategy> {
    match kind {
        PanningType::None => Box::new(NodeChainStrategy::new(Passthrough, graph)),
        PanningType::Stereo => Box::new(NodeChainStrategy::new(StereoPan, graph)),
        PanningType::EqualPower => Box::new(NodeChainStrategy::new(Panner3d::equal_power(), graph)),
        PanningType::Hrtf => Box::new(NodeChainStrategy::new(Panner3d::hrtf(), graph)),
    }
}
