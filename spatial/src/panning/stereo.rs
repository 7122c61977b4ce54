use super::{PanningAlgorithm, ParticipantNodes};
use audio_graph::{AudioGraph, GraphError};
use spatial_core::{NodeId, PanningType, Position};

/// Linear left/right pan from the horizontal offset; no depth or elevation cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct StereoPan;

impl StereoPan {
    /// Pan value in `[-1, 1]` for a position: `x / 2`, clamped.
    pub fn pan_for(position: &Position) -> f32 {
        (position.x / 2.0).clamp(-1.0, 1.0)
    }
}

impl PanningAlgorithm for StereoPan {
    fn kind(&self) -> PanningType {
        PanningType::Stereo
    }

    fn create_panner(&self, graph: &mut dyn AudioGraph) -> Result<Option<NodeId>, GraphError> {
        graph.create_stereo_panner_node().map(Some)
    }

    fn apply_position(
        &self,
        graph: &mut dyn AudioGraph,
        nodes: &ParticipantNodes,
        position: Position,
    ) -> Result<(), GraphError> {
        let panner = nodes.panner.ok_or_else(|| {
            GraphError::UnsupportedNode("stereo chain without a panner".to_string())
        })?;
        graph.set_pan(panner, Self::pan_for(&position))
    }
}
