use super::{ListenerControl, PanningAlgorithm, PanningStrategy};
use audio_graph::{AudioGraph, GraphError};
use log::{debug, info, trace, warn};
use spatial_core::{Error, NodeId, PanningType, Position, SourceHandle, SpatialAudioSettings};
use std::collections::HashMap;

/// Nodes owned for one participant: an optional panner feeding a gain
/// stage that feeds the graph destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantNodes {
    pub panner: Option<NodeId>,
    pub gain: NodeId,
}

impl ParticipantNodes {
    /// Node sources connect into
    pub fn input(&self) -> NodeId {
        self.panner.unwrap_or(self.gain)
    }

    pub fn output(&self) -> NodeId {
        self.gain
    }

    /// All nodes, in signal order
    pub fn all(&self) -> Vec<NodeId> {
        self.panner.into_iter().chain(Some(self.gain)).collect()
    }
}

/// Per-participant chain bookkeeping shared by every panning algorithm.
pub struct NodeChainStrategy<A> {
    algorithm: A,
    chains: HashMap<String, ParticipantNodes>,
}

impl<A: PanningAlgorithm> NodeChainStrategy<A> {
    pub fn new(mut algorithm: A, graph: &mut dyn AudioGraph) -> Self {
        if let Err(e) = algorithm.initialize(graph) {
            warn!("Failed to initialize {} strategy: {}", algorithm.kind(), e);
        }

        Self {
            algorithm,
            chains: HashMap::new(),
        }
    }

    pub fn nodes(&self, participant_id: &str) -> Option<&ParticipantNodes> {
        self.chains.get(participant_id)
    }

    fn build_chain(
        &self,
        graph: &mut dyn AudioGraph,
        volume: f32,
    ) -> Result<ParticipantNodes, GraphError> {
        let gain = graph.create_gain_node()?;
        let panner = match self.algorithm.create_panner(graph) {
            Ok(panner) => panner,
            Err(e) => {
                if let Err(release_error) = graph.release(gain) {
                    warn!("Failed to release {}: {}", gain, release_error);
                }
                return Err(e);
            }
        };

        let nodes = ParticipantNodes { panner, gain };
        if let Err(e) = self.wire_chain(graph, &nodes, volume) {
            release_chain(graph, &nodes);
            return Err(e);
        }
        Ok(nodes)
    }

    fn wire_chain(
        &self,
        graph: &mut dyn AudioGraph,
        nodes: &ParticipantNodes,
        volume: f32,
    ) -> Result<(), GraphError> {
        self.algorithm
            .apply_initial_volume(graph, nodes.gain, volume)?;
        if let Some(panner) = nodes.panner {
            graph.connect(panner, nodes.gain)?;
        }
        let destination = graph.destination();
        graph.connect(nodes.gain, destination)
    }
}

/// Disconnect and release every node of a chain, continuing past failures.
/// Returns the first failure.
fn release_chain(graph: &mut dyn AudioGraph, nodes: &ParticipantNodes) -> Option<GraphError> {
    let mut first_error = None;
    for node in nodes.all() {
        let result = graph.disconnect(node).and_then(|_| graph.release(node));
        if let Err(e) = result {
            warn!("Failed to release {}: {}", node, e);
            first_error.get_or_insert(e);
        }
    }
    first_error
}

impl<A: PanningAlgorithm> PanningStrategy for NodeChainStrategy<A> {
    fn kind(&self) -> PanningType {
        self.algorithm.kind()
    }

    fn create_nodes(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
        settings: &SpatialAudioSettings,
    ) -> Result<Vec<NodeId>, Error> {
        if let Some(existing) = self.chains.get(participant_id) {
            trace!(
                "{} nodes already exist for participant {}",
                self.kind(),
                participant_id
            );
            return Ok(existing.all());
        }

        let nodes = self.build_chain(graph, settings.master_volume)?;
        debug!(
            "Created {} nodes for participant {} with gain {}",
            self.kind(),
            participant_id,
            settings.master_volume
        );
        self.chains.insert(participant_id.to_string(), nodes);
        Ok(nodes.all())
    }

    fn update_position(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
        position: Position,
    ) -> Result<(), Error> {
        let Some(nodes) = self.chains.get(participant_id) else {
            warn!(
                "No {} nodes found for participant {}",
                self.kind(),
                participant_id
            );
            return Ok(());
        };

        self.algorithm.apply_position(graph, nodes, position)?;
        trace!(
            "Updated {} position for {} to {}",
            self.kind(),
            participant_id,
            position
        );
        Ok(())
    }

    fn connect_source(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
        source: SourceHandle,
    ) -> Result<(), Error> {
        let Some(nodes) = self.chains.get(participant_id) else {
            warn!(
                "No {} nodes found for participant {}, source not connected",
                self.kind(),
                participant_id
            );
            return Ok(());
        };

        if let Err(e) = graph.disconnect(source.node()) {
            debug!(
                "Source for {} was not connected before: {}",
                participant_id, e
            );
        }
        graph.connect(source.node(), nodes.input())?;
        debug!(
            "Connected source for participant {} to {} chain",
            participant_id,
            self.kind()
        );
        Ok(())
    }

    fn disconnect_participant(
        &mut self,
        graph: &mut dyn AudioGraph,
        participant_id: &str,
    ) -> Result<(), Error> {
        let Some(nodes) = self.chains.remove(participant_id) else {
            debug!(
                "{} nodes for participant {} already released",
                self.kind(),
                participant_id
            );
            return Ok(());
        };

        let failure = release_chain(graph, &nodes);
        debug!(
            "Disconnected {} nodes for participant {}",
            self.kind(),
            participant_id
        );
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn input_node(&self, participant_id: &str) -> Option<NodeId> {
        self.chains.get(participant_id).map(ParticipantNodes::input)
    }

    fn output_node(&self, participant_id: &str) -> Option<NodeId> {
        self.chains.get(participant_id).map(ParticipantNodes::output)
    }

    fn chain_count(&self) -> usize {
        self.chains.len()
    }

    fn destroy(&mut self, graph: &mut dyn AudioGraph) -> Result<(), Error> {
        let mut first_error = None;
        for (participant_id, nodes) in self.chains.drain() {
            if let Some(e) = release_chain(graph, &nodes) {
                warn!("Failed to release nodes of {}: {}", participant_id, e);
                first_error.get_or_insert(e);
            }
        }

        info!("{} strategy destroyed", self.algorithm.kind());
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn listener_control(&mut self) -> Option<&mut dyn ListenerControl> {
        Some(self)
    }
}

impl<A: PanningAlgorithm> ListenerControl for NodeChainStrategy<A> {
    fn update_global_settings(
        &mut self,
        graph: &mut dyn AudioGraph,
        settings: &SpatialAudioSettings,
    ) -> Result<(), Error> {
        self.algorithm.apply_listener(graph, settings)?;
        for nodes in self.chains.values() {
            self.algorithm
                .apply_volume(graph, nodes.gain, settings.master_volume)?;
        }
        debug!("Updated {} global settings", self.algorithm.kind());
        Ok(())
    }
}
