use super::{PanningAlgorithm, ParticipantNodes};
use audio_graph::{AudioGraph, GraphError, PannerConfig, PanningModel};
use log::debug;
use spatial_core::{ListenerOrientation, NodeId, PanningType, Position, SpatialAudioSettings};
use std::time::Duration;

/// Gain changes on 3D chains ramp over this long to avoid clicks.
pub const GAIN_RAMP: Duration = Duration::from_millis(100);

/// 3D panner with distance attenuation disabled, so azimuth is the only cue.
/// The panning model selects equal-power or HRTF processing.
#[derive(Debug, Clone, Copy)]
pub struct Panner3d {
    model: PanningModel,
}

impl Panner3d {
    pub fn equal_power() -> Self {
        Self {
            model: PanningModel::EqualPower,
        }
    }

    pub fn hrtf() -> Self {
        Self {
            model: PanningModel::Hrtf,
        }
    }
}

impl PanningAlgorithm for Panner3d {
    fn kind(&self) -> PanningType {
        match self.model {
            PanningModel::EqualPower => PanningType::EqualPower,
            PanningModel::Hrtf => PanningType::Hrtf,
        }
    }

    fn initialize(&mut self, graph: &mut dyn AudioGraph) -> Result<(), GraphError> {
        graph.set_listener(Position::ORIGIN, ListenerOrientation::default())?;
        debug!("{} listener initialized", self.kind());
        Ok(())
    }

    fn create_panner(&self, graph: &mut dyn AudioGraph) -> Result<Option<NodeId>, GraphError> {
        graph
            .create_panner_node(&PannerConfig::flat_rolloff(self.model))
            .map(Some)
    }

    fn apply_initial_volume(
        &self,
        graph: &mut dyn AudioGraph,
        gain: NodeId,
        volume: f32,
    ) -> Result<(), GraphError> {
        graph.set_gain(gain, 0.0)?;
        graph.ramp_gain(gain, volume, GAIN_RAMP)
    }

    fn apply_volume(
        &self,
        graph: &mut dyn AudioGraph,
        gain: NodeId,
        volume: f32,
    ) -> Result<(), GraphError> {
        graph.ramp_gain(gain, volume, GAIN_RAMP)
    }

    fn apply_position(
        &self,
        graph: &mut dyn AudioGraph,
        nodes: &ParticipantNodes,
        position: Position,
    ) -> Result<(), GraphError> {
        let panner = nodes.panner.ok_or_else(|| {
            GraphError::UnsupportedNode("3D chain without a panner".to_string())
        })?;
        graph.set_panner_position(
            panner,
            Position::new(position.x, position.y, position.z_or_zero()),
        )
    }

    fn apply_listener(
        &self,
        graph: &mut dyn AudioGraph,
        settings: &SpatialAudioSettings,
    ) -> Result<(), GraphError> {
        let position = settings.listener_position;
        graph.set_listener(
            Position::new(position.x, position.y, position.z_or_zero()),
            settings.listener_orientation,
        )
    }
}
