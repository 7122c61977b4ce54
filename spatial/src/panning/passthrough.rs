use super::{PanningAlgorithm, ParticipantNodes};
use audio_graph::{AudioGraph, GraphError};
use log::trace;
use spatial_core::{NodeId, PanningType, Position};

/// Mono passthrough: a single gain stage, positions carry no cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PanningAlgorithm for Passthrough {
    fn kind(&self) -> PanningType {
        PanningType::None
    }

    fn create_panner(&self, _graph: &mut dyn AudioGraph) -> Result<Option<NodeId>, GraphError> {
        Ok(None)
    }

    fn apply_position(
        &self,
        _graph: &mut dyn AudioGraph,
        _nodes: &ParticipantNodes,
        _position: Position,
    ) -> Result<(), GraphError> {
        trace!("Position update ignored for mono audio");
        Ok(())
    }
}
