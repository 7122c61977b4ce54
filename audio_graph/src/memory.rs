use crate::{AudioGraph, DeviceState, GraphError, PannerConfig, ResumeFuture};
use log::{debug, trace};
use spatial_core::{ListenerOrientation, NodeId, Position};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a node in the memory graph represents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Destination,
    Source,
    Gain,
    StereoPanner,
    Panner(PannerConfig),
}

/// Recorded parameters of a memory graph node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub kind: NodeKind,
    pub gain: f32,
    /// Duration of the last gain ramp, if the gain was ramped
    pub gain_ramp: Option<Duration>,
    pub pan: f32,
    pub position: Option<Position>,
}

impl NodeState {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            gain: 1.0,
            gain_ramp: None,
            pan: 0.0,
            position: None,
        }
    }
}

/// In-memory [`AudioGraph`] that records nodes, connections and parameters.
pub struct MemoryGraph {
    next_id: u64,
    destination: NodeId,
    nodes: HashMap<NodeId, NodeState>,
    edges: HashSet<(NodeId, NodeId)>,
    listener: (Position, ListenerOrientation),
    state: Arc<Mutex<DeviceState>>,
    fail_next_resume: bool,
    nodes_created: usize,
    nodes_released: usize,
}

impl MemoryGraph {
    pub fn new() -> Self {
        let destination = NodeId::from_raw(0);
        let mut nodes = HashMap::new();
        nodes.insert(destination, NodeState::new(NodeKind::Destination));

        Self {
            next_id: 1,
            destination,
            nodes,
            edges: HashSet::new(),
            listener: (Position::ORIGIN, ListenerOrientation::default()),
            state: Arc::new(Mutex::new(DeviceState::Running)),
            fail_next_resume: false,
            nodes_created: 0,
            nodes_released: 0,
        }
    }

    /// A graph whose output device starts suspended.
    pub fn suspended() -> Self {
        let graph = Self::new();
        graph.set_state(DeviceState::Suspended);
        graph
    }

    pub fn suspend(&mut self) {
        self.set_state(DeviceState::Suspended);
    }

    /// Make the next call to `resume` fail.
    pub fn fail_next_resume(&mut self) {
        self.fail_next_resume = true;
    }

    /// Create a source node the way a host hands one to the engine.
    /// Sources are not counted in `nodes_created`.
    pub fn create_source(&mut self) -> NodeId {
        let id = self.allocate();
        self.nodes.insert(id, NodeState::new(NodeKind::Source));
        id
    }

    pub fn node(&self, node: NodeId) -> Option<&NodeState> {
        self.nodes.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn gain(&self, node: NodeId) -> Option<f32> {
        self.nodes.get(&node).map(|n| n.gain)
    }

    pub fn pan(&self, node: NodeId) -> Option<f32> {
        self.nodes.get(&node).map(|n| n.pan)
    }

    pub fn panner_position(&self, node: NodeId) -> Option<Position> {
        self.nodes.get(&node).and_then(|n| n.position)
    }

    pub fn listener(&self) -> (Position, ListenerOrientation) {
        self.listener
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.contains(&(from, to))
    }

    pub fn edges_from(&self, node: NodeId) -> Vec<NodeId> {
        let mut targets: Vec<NodeId> = self
            .edges
            .iter()
            .filter(|(from, _)| *from == node)
            .map(|(_, to)| *to)
            .collect();
        targets.sort();
        targets
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Processing nodes (gain and panners) created so far
    pub fn nodes_created(&self) -> usize {
        self.nodes_created
    }

    pub fn nodes_released(&self) -> usize {
        self.nodes_released
    }

    /// Live processing nodes, excluding sources and the destination
    pub fn live_node_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| !matches!(n.kind, NodeKind::Destination | NodeKind::Source))
            .count()
    }

    /// Live nodes matching a predicate on their kind
    pub fn count_nodes(&self, predicate: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.values().filter(|n| predicate(&n.kind)).count()
    }

    fn set_state(&self, state: DeviceState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    fn ensure_open(&self) -> Result<(), GraphError> {
        if self.state() == DeviceState::Closed {
            return Err(GraphError::Closed);
        }
        Ok(())
    }

    fn insert_processing_node(&mut self, kind: NodeKind) -> Result<NodeId, GraphError> {
        self.ensure_open()?;
        let id = self.allocate();
        self.nodes.insert(id, NodeState::new(kind));
        self.nodes_created += 1;
        trace!("Created {:?} as {}", kind, id);
        Ok(id)
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeState, GraphError> {
        self.ensure_open()?;
        self.nodes.get_mut(&node).ok_or(GraphError::UnknownNode(node))
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGraph for MemoryGraph {
    fn state(&self) -> DeviceState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_gain_node(&mut self) -> Result<NodeId, GraphError> {
        self.insert_processing_node(NodeKind::Gain)
    }

    fn create_stereo_panner_node(&mut self) -> Result<NodeId, GraphError> {
        self.insert_processing_node(NodeKind::StereoPanner)
    }

    fn create_panner_node(&mut self, config: &PannerConfig) -> Result<NodeId, GraphError> {
        self.insert_processing_node(NodeKind::Panner(*config))
    }

    fn set_gain(&mut self, node: NodeId, value: f32) -> Result<(), GraphError> {
        let state = self.node_mut(node)?;
        state.gain = value;
        state.gain_ramp = None;
        Ok(())
    }

    fn ramp_gain(
        &mut self,
        node: NodeId,
        target: f32,
        duration: Duration,
    ) -> Result<(), GraphError> {
        // Ramps are applied instantly; only the target and duration are recorded.
        let state = self.node_mut(node)?;
        state.gain = target;
        state.gain_ramp = Some(duration);
        Ok(())
    }

    fn set_pan(&mut self, node: NodeId, pan: f32) -> Result<(), GraphError> {
        let state = self.node_mut(node)?;
        if state.kind != NodeKind::StereoPanner {
            return Err(GraphError::UnsupportedNode(format!("{} is not a stereo panner", node)));
        }
        state.pan = pan;
        Ok(())
    }

    fn set_panner_position(&mut self, node: NodeId, position: Position) -> Result<(), GraphError> {
        let state = self.node_mut(node)?;
        if !matches!(state.kind, NodeKind::Panner(_)) {
            return Err(GraphError::UnsupportedNode(format!("{} is not a 3D panner", node)));
        }
        state.position = Some(position);
        Ok(())
    }

    fn set_listener(
        &mut self,
        position: Position,
        orientation: ListenerOrientation,
    ) -> Result<(), GraphError> {
        self.ensure_open()?;
        self.listener = (position, orientation);
        Ok(())
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.ensure_open()?;
        for node in [from, to] {
            if !self.nodes.contains_key(&node) {
                return Err(GraphError::UnknownNode(node));
            }
        }
        self.edges.insert((from, to));
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.ensure_open()?;
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::UnknownNode(node));
        }
        self.edges.retain(|(from, _)| *from != node);
        Ok(())
    }

    fn release(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.ensure_open()?;
        if node == self.destination {
            return Err(GraphError::UnsupportedNode("cannot release the destination".to_string()));
        }
        self.nodes.remove(&node).ok_or(GraphError::UnknownNode(node))?;
        self.edges.retain(|(from, to)| *from != node && *to != node);
        self.nodes_released += 1;
        Ok(())
    }

    fn resume(&mut self) -> ResumeFuture {
        let state = Arc::clone(&self.state);
        let fail = std::mem::take(&mut self.fail_next_resume);

        Box::pin(async move {
            let mut guard = state
                .lock()
                .map_err(|_| GraphError::ResumeFailed("device state lock poisoned".to_string()))?;
            match *guard {
                DeviceState::Closed => Err(GraphError::Closed),
                _ if fail => Err(GraphError::ResumeFailed("device refused to resume".to_string())),
                _ => {
                    *guard = DeviceState::Running;
                    Ok(())
                }
            }
        })
    }

    fn close(&mut self) -> Result<(), GraphError> {
        self.ensure_open()?;
        self.set_state(DeviceState::Closed);
        debug!("Memory graph closed with {} live nodes", self.live_node_count());
        Ok(())
    }
}
