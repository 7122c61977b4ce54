use crate::events::{EventBus, ListenerId};
use crate::registry::ParticipantRegistry;
use audio_graph::{AudioGraph, DeviceState};
use log::{debug, error, info, warn};
use spatial::{create_strategy, LayoutKind, LayoutStrategy, PanningStrategy};
use spatial_core::{
    clamp_volume, Error, EventKind, EventPayload, NewParticipant, PanningType,
    ParticipantAdded, ParticipantAudioData, ParticipantMoved, ParticipantRemoved, SettingsUpdate,
    SettingsUpdated, SourceHandle, SpatialAudioSettings, SpatialEvent, StrategyChanged,
};
use std::collections::{HashMap, HashSet};

/// Orchestrates participants, layout and the active panning strategy for
/// one session.
///
/// Every operation is synchronous and meant to be driven from a single
/// control context. Caller mistakes (unknown participant ids) and graph
/// failures are logged, never returned: the worst outcome is a participant
/// without spatial positioning until the next reconciliation.
pub struct SpatialAudioManager<G: AudioGraph> {
    graph: G,
    strategy: Box<dyn PanningStrategy>,
    layout: Box<dyn LayoutStrategy>,
    registry: ParticipantRegistry,
    settings: SpatialAudioSettings,
    events: EventBus,
}

impl<G: AudioGraph> SpatialAudioManager<G> {
    /// Create a manager with default settings and the fixed-azimuth layout
    pub fn new(graph: G) -> Self {
        Self::with_settings(graph, SpatialAudioSettings::default(), LayoutKind::default())
    }

    pub fn with_layout(graph: G, layout: LayoutKind) -> Self {
        Self::with_settings(graph, SpatialAudioSettings::default(), layout)
    }

    pub fn with_settings(mut graph: G, mut settings: SpatialAudioSettings, layout: LayoutKind) -> Self {
        settings.master_volume = clamp_volume(settings.master_volume);
        let strategy = create_strategy(settings.kind, &mut graph);

        let mut manager = Self {
            graph,
            strategy,
            layout: layout.create(),
            registry: ParticipantRegistry::new(),
            settings,
            events: EventBus::new(),
        };
        if manager.settings.enabled {
            manager.push_global_settings();
        }

        info!(
            "Spatial audio manager initialized ({} panning, {} layout, {})",
            manager.settings.kind,
            layout,
            if manager.settings.enabled { "enabled" } else { "disabled" }
        );
        manager
    }

    /// Add a participant, or merge into the existing entry with the same id.
    pub fn add_participant(&mut self, data: NewParticipant) {
        let participant_id = data.participant_id.clone();

        if let Some(existing) = self.registry.get_mut(&participant_id) {
            if data.display_name.is_some() {
                existing.display_name = data.display_name;
            }
            existing.is_muted = data.is_muted;
            let replaced = match data.source {
                Some(source) => existing.source.replace(source).filter(|old| *old != source),
                None => None,
            };
            if let (Some(old), true) = (replaced, self.settings.enabled) {
                self.detach_source(&participant_id, old);
            }
            debug!("Updated existing participant {}", participant_id);
        } else {
            let position = self
                .layout
                .position_for_index(data.track_index, self.registry.len() + 1);
            self.registry.insert(data.into_audio_data(position));
            self.recalculate_all_positions();
            info!("Added new participant {} at {}", participant_id, position);
        }

        if self.settings.enabled {
            self.attach_participant(&participant_id);
        }

        if let Some(participant) = self.registry.get(&participant_id) {
            let position = participant.position;
            self.events.emit(ParticipantAdded {
                participant_id,
                position,
            });
        }
    }

    pub fn remove_participant(&mut self, participant_id: &str) {
        if !self.registry.contains(participant_id) {
            warn!("Participant {} not found for removal", participant_id);
            return;
        }

        if self.settings.enabled {
            if let Err(e) = self
                .strategy
                .disconnect_participant(&mut self.graph, participant_id)
            {
                error!("Failed to disconnect participant {}: {}", participant_id, e);
            }
        }

        self.registry.remove(participant_id);
        info!("Removed participant {}", participant_id);

        self.events.emit(ParticipantRemoved {
            participant_id: participant_id.to_string(),
        });
        self.recalculate_all_positions();
    }

    /// Rebuild the registry to exactly match `participant_ids`, which must be
    /// the complete current list. Seats follow the list order.
    pub fn synchronize_with_all_participants<I, S>(&mut self, participant_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<String> = participant_ids
            .into_iter()
            .map(Into::into)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        info!("Synchronizing with {} participants", ids.len());

        let mut previous: HashMap<String, ParticipantAudioData> = self
            .registry
            .drain()
            .into_iter()
            .map(|p| (p.participant_id.clone(), p))
            .collect();

        for (index, participant_id) in ids.iter().enumerate() {
            let entry = match previous.remove(participant_id) {
                Some(existing) => ParticipantAudioData {
                    track_index: index,
                    display_name: existing
                        .display_name
                        .or_else(|| Some(format!("Participant {}", index + 1))),
                    ..existing
                },
                None => ParticipantAudioData {
                    participant_id: participant_id.clone(),
                    display_name: Some(format!("Participant {}", index + 1)),
                    is_local: false,
                    is_muted: true,
                    track_index: index,
                    position: Default::default(),
                    source: None,
                },
            };
            self.registry.insert(entry);
        }

        // Participants that are gone must not keep graph resources alive
        if self.settings.enabled {
            for participant_id in previous.keys() {
                if let Err(e) = self
                    .strategy
                    .disconnect_participant(&mut self.graph, participant_id)
                {
                    error!("Failed to disconnect participant {}: {}", participant_id, e);
                }
            }
        }
        if !previous.is_empty() {
            debug!("Dropped {} participants during synchronization", previous.len());
        }

        self.recalculate_all_positions();

        if self.settings.enabled {
            let with_sources: Vec<String> = self
                .registry
                .iter()
                .filter(|p| p.has_source())
                .map(|p| p.participant_id.clone())
                .collect();
            for participant_id in with_sources {
                self.attach_participant(&participant_id);
            }
        }
    }

    /// Store a participant's source and, when enabled, wire it into the
    /// active strategy.
    pub fn connect_participant_source(&mut self, participant_id: &str, source: SourceHandle) {
        let Some(participant) = self.registry.get_mut(participant_id) else {
            warn!(
                "Participant {} not found for source connection",
                participant_id
            );
            return;
        };
        let replaced = participant
            .source
            .replace(source)
            .filter(|old| *old != source);

        self.ensure_device_running();

        if self.settings.enabled {
            if let Some(old) = replaced {
                self.detach_source(participant_id, old);
            }
            debug!(
                "Connecting source for {} to {} strategy",
                participant_id,
                self.strategy.kind()
            );
            self.attach_participant(participant_id);
        } else {
            debug!(
                "Spatial audio disabled, source for {} stored but not connected",
                participant_id
            );
        }
    }

    /// Mute is a volume concern of the caller; graph wiring is untouched.
    pub fn update_participant_mute_status(&mut self, participant_id: &str, is_muted: bool) {
        match self.registry.get_mut(participant_id) {
            Some(participant) => {
                participant.is_muted = is_muted;
                debug!("Updated mute status for {}: {}", participant_id, is_muted);
            }
            None => warn!(
                "Participant {} not found for mute update",
                participant_id
            ),
        }
    }

    /// Replace the active panning strategy, moving every participant over.
    pub fn switch_strategy(&mut self, new_type: PanningType) {
        let old_type = self.strategy.kind();
        if new_type == old_type {
            debug!("Already using {} strategy", new_type);
            return;
        }

        if self.settings.enabled {
            let sources: Vec<(String, SourceHandle)> = self
                .registry
                .iter()
                .filter_map(|p| p.source.map(|s| (p.participant_id.clone(), s)))
                .collect();
            for (participant_id, source) in sources {
                debug!(
                    "Disconnecting source for {} before strategy switch",
                    participant_id
                );
                self.detach_source(&participant_id, source);
            }
        }

        if let Err(e) = self.strategy.destroy(&mut self.graph) {
            error!("Failed to destroy {} strategy cleanly: {}", old_type, e);
        }
        self.strategy = create_strategy(new_type, &mut self.graph);
        self.settings.kind = new_type;

        if self.settings.enabled {
            self.attach_all();
            self.push_global_settings();
        }

        info!("Switched from {} to {} strategy", old_type, new_type);
        self.events.emit(StrategyChanged { old_type, new_type });
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.settings.enabled {
            return;
        }
        self.apply_enabled(enabled);
        self.emit_settings_updated();
    }

    /// Merge a partial settings change. Emits exactly one `settingsUpdated`
    /// after every derived action has run.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        debug!("Updating settings with {:?}", update);
        let was_enabled = self.settings.enabled;

        if let Some(volume) = update.master_volume {
            self.settings.master_volume = clamp_volume(volume);
        }
        if let Some(position) = update.listener_position {
            self.settings.listener_position = position;
        }
        if let Some(orientation) = update.listener_orientation {
            self.settings.listener_orientation = orientation;
        }

        // Disable before switching so the old chains are not rebuilt first
        if update.enabled == Some(false) && was_enabled {
            self.apply_enabled(false);
        }
        if let Some(kind) = update.kind {
            if kind != self.strategy.kind() {
                info!(
                    "Strategy change requested: {} -> {}",
                    self.strategy.kind(),
                    kind
                );
                self.switch_strategy(kind);
            }
        }
        if update.enabled == Some(true) && !was_enabled {
            self.apply_enabled(true);
        }

        if self.settings.enabled {
            self.push_global_settings();
        }

        debug!("Settings updated: {:?}", self.settings);
        self.emit_settings_updated();
    }

    pub fn settings(&self) -> SpatialAudioSettings {
        self.settings.clone()
    }

    pub fn participant(&self, participant_id: &str) -> Option<ParticipantAudioData> {
        self.registry.get(participant_id).cloned()
    }

    pub fn participants(&self) -> Vec<ParticipantAudioData> {
        self.registry.iter().cloned().collect()
    }

    pub fn participant_count(&self) -> usize {
        self.registry.len()
    }

    pub fn active_strategy(&self) -> PanningType {
        self.strategy.kind()
    }

    pub fn strategy(&self) -> &dyn PanningStrategy {
        self.strategy.as_ref()
    }

    pub fn layout(&self) -> &dyn LayoutStrategy {
        self.layout.as_ref()
    }

    /// The audio graph (the host "audio context") the manager renders into
    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn add_event_listener<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&SpatialEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.events.add_listener(kind, handler)
    }

    /// Typed variant of [`add_event_listener`](Self::add_event_listener).
    pub fn subscribe<E, F>(&mut self, handler: F) -> ListenerId
    where
        E: EventPayload,
        F: FnMut(&E) -> anyhow::Result<()> + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn remove_event_listener(&mut self, listener: ListenerId) -> bool {
        self.events.remove_listener(listener)
    }

    /// Tear down every node, drop all participants and listeners, and close
    /// the graph. The closed graph is handed back to the caller.
    pub fn destroy(mut self) -> G {
        if let Err(e) = self.strategy.destroy(&mut self.graph) {
            error!("Failed to destroy {} strategy cleanly: {}", self.strategy.kind(), e);
        }
        self.registry.clear();
        self.events.clear();

        if self.graph.state() != DeviceState::Closed {
            if let Err(e) = self.graph.close() {
                error!("Failed to close audio graph: {}", e);
            }
        }

        info!("Spatial audio manager destroyed");
        self.graph
    }

    fn apply_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;

        if enabled {
            self.attach_all();
            self.push_global_settings();
            info!("Spatial audio enabled");
        } else {
            for participant_id in self.registry.ids() {
                if let Err(e) = self
                    .strategy
                    .disconnect_participant(&mut self.graph, &participant_id)
                {
                    error!("Failed to disconnect participant {}: {}", participant_id, e);
                }
            }
            info!("Spatial audio disabled");
        }
    }

    fn attach_all(&mut self) {
        for participant_id in self.registry.ids() {
            self.attach_participant(&participant_id);
        }
    }

    /// Create (idempotently) the participant's chain, connect its source and
    /// apply its position. Failures are logged.
    fn attach_participant(&mut self, participant_id: &str) {
        if let Err(e) = self.try_attach_participant(participant_id) {
            error!(
                "Failed to attach participant {} to {} strategy: {}",
                participant_id,
                self.strategy.kind(),
                e
            );
        }
    }

    fn try_attach_participant(&mut self, participant_id: &str) -> Result<(), Error> {
        let participant = self
            .registry
            .get(participant_id)
            .ok_or_else(|| Error::NotFound(format!("participant {}", participant_id)))?;
        let (source, position) = (participant.source, participant.position);

        self.strategy
            .create_nodes(&mut self.graph, participant_id, &self.settings)?;
        if let Some(source) = source {
            self.strategy
                .connect_source(&mut self.graph, participant_id, source)?;
        }
        self.strategy
            .update_position(&mut self.graph, participant_id, position)
    }

    fn detach_source(&mut self, participant_id: &str, source: SourceHandle) {
        if let Err(e) = self.graph.disconnect(source.node()) {
            debug!("Source for {} was not connected: {}", participant_id, e);
        }
    }

    fn push_global_settings(&mut self) {
        if let Some(control) = self.strategy.listener_control() {
            if let Err(e) = control.update_global_settings(&mut self.graph, &self.settings) {
                error!("Failed to apply global settings: {}", e);
            }
        }
    }

    /// Best-effort resume of a suspended output device. Never blocks.
    fn ensure_device_running(&mut self) {
        match self.graph.state() {
            DeviceState::Running => {}
            DeviceState::Closed => warn!("Output device is closed"),
            DeviceState::Suspended => {
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    warn!("Output device suspended and no async runtime available to resume it");
                    return;
                };

                info!("Output device suspended, attempting to resume");
                let resume = self.graph.resume();
                runtime.spawn(async move {
                    match resume.await {
                        Ok(()) => info!("Output device resumed"),
                        Err(e) => error!("Failed to resume output device: {}", e),
                    }
                });
            }
        }
    }

    /// Assign the layout's positions to the whole registry, in seat order.
    fn recalculate_all_positions(&mut self) {
        let positions = self.layout.calculate_positions(self.registry.len());
        if positions.is_empty() {
            return;
        }

        let moved: Vec<(String, spatial_core::Position)> = self
            .registry
            .iter_mut()
            .enumerate()
            .map(|(index, participant)| {
                // Rooms larger than the layout reuse its seats
                participant.position = positions[index % positions.len()];
                (participant.participant_id.clone(), participant.position)
            })
            .collect();

        for (participant_id, position) in moved {
            if self.settings.enabled && self.strategy.input_node(&participant_id).is_some() {
                if let Err(e) =
                    self.strategy
                        .update_position(&mut self.graph, &participant_id, position)
                {
                    error!("Failed to position participant {}: {}", participant_id, e);
                }
            }
            self.events.emit(ParticipantMoved {
                participant_id,
                position,
            });
        }

        debug!(
            "Recalculated positions for {} participants",
            self.registry.len()
        );
    }

    fn emit_settings_updated(&mut self) {
        let settings = self.settings.clone();
        self.events.emit(SettingsUpdated { settings });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_graph::{GraphError, MemoryGraph, NodeKind, PannerConfig, ResumeFuture};
    use mockall::mock;
    use spatial::FixedAzimuthLayout;
    use spatial_core::{ListenerOrientation, NodeId, Position};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    mock! {
        Graph {}
        impl AudioGraph for Graph {
            fn state(&self) -> DeviceState;
            fn destination(&self) -> NodeId;
            fn create_gain_node(&mut self) -> Result<NodeId, GraphError>;
            fn create_stereo_panner_node(&mut self) -> Result<NodeId, GraphError>;
            fn create_panner_node(&mut self, config: &PannerConfig) -> Result<NodeId, GraphError>;
            fn set_gain(&mut self, node: NodeId, value: f32) -> Result<(), GraphError>;
            fn ramp_gain(&mut self, node: NodeId, target: f32, duration: Duration) -> Result<(), GraphError>;
            fn set_pan(&mut self, node: NodeId, pan: f32) -> Result<(), GraphError>;
            fn set_panner_position(&mut self, node: NodeId, position: Position) -> Result<(), GraphError>;
            fn set_listener(&mut self, position: Position, orientation: ListenerOrientation) -> Result<(), GraphError>;
            fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError>;
            fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError>;
            fn release(&mut self, node: NodeId) -> Result<(), GraphError>;
            fn resume(&mut self) -> ResumeFuture;
            fn close(&mut self) -> Result<(), GraphError>;
        }
    }

    fn enabled(kind: PanningType) -> SpatialAudioSettings {
        SpatialAudioSettings {
            enabled: true,
            kind,
            ..SpatialAudioSettings::default()
        }
    }

    fn enabled_manager(kind: PanningType) -> SpatialAudioManager<MemoryGraph> {
        SpatialAudioManager::with_settings(MemoryGraph::new(), enabled(kind), LayoutKind::FixedAzimuth)
    }

    fn add_with_source(manager: &mut SpatialAudioManager<MemoryGraph>, id: &str, index: usize) -> SourceHandle {
        let source = SourceHandle::new(manager.graph_mut().create_source());
        manager.add_participant(NewParticipant::new(id, index).with_source(source));
        source
    }

    fn record_events(manager: &mut SpatialAudioManager<MemoryGraph>) -> Arc<Mutex<Vec<SpatialEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let seen = Arc::clone(&seen);
            manager.add_event_listener(kind, move |event| {
                seen.lock().unwrap().push(event.clone());
                Ok(())
            });
        }
        seen
    }

    fn kinds(events: &Arc<Mutex<Vec<SpatialEvent>>>) -> Vec<EventKind> {
        events.lock().unwrap().iter().map(SpatialEvent::kind).collect()
    }

    #[test]
    fn adding_an_existing_participant_merges() {
        let mut manager = enabled_manager(PanningType::Stereo);
        manager.add_participant(NewParticipant::new("a", 0).with_display_name("Alice"));
        let created = manager.graph().nodes_created();

        manager.add_participant(NewParticipant::new("a", 0).muted(true));

        assert_eq!(manager.participant_count(), 1);
        assert_eq!(manager.graph().nodes_created(), created);
        let a = manager.participant("a").unwrap();
        assert_eq!(a.display_name.as_deref(), Some("Alice"));
        assert!(a.is_muted);
    }

    #[test]
    fn replacing_a_source_rewires_the_chain() {
        let mut manager = enabled_manager(PanningType::None);
        let old = add_with_source(&mut manager, "a", 0);
        let new = SourceHandle::new(manager.graph_mut().create_source());

        manager.connect_participant_source("a", new);

        let input = manager.strategy().input_node("a").unwrap();
        assert!(manager.graph().edges_from(old.node()).is_empty());
        assert_eq!(manager.graph().edges_from(new.node()), vec![input]);
    }

    #[test]
    fn positions_track_participant_count() {
        let mut manager = enabled_manager(PanningType::None);
        for (index, id) in ["a", "b", "c"].into_iter().enumerate() {
            manager.add_participant(NewParticipant::new(id, index));
        }

        let positions: Vec<Position> = manager.participants().iter().map(|p| p.position).collect();
        assert_eq!(positions, FixedAzimuthLayout::new().calculate_positions(3));
    }

    #[test]
    fn eight_participants_switch_to_hrtf() {
        let mut manager = enabled_manager(PanningType::None);
        let mut sources = Vec::new();
        for index in 0..8 {
            let id = format!("p{}", index);
            sources.push(add_with_source(&mut manager, &id, index));
        }
        let events = record_events(&mut manager);

        manager.switch_strategy(PanningType::Hrtf);

        let graph = manager.graph();
        assert_eq!(graph.count_nodes(|k| matches!(k, NodeKind::Panner(_))), 8);
        assert_eq!(graph.count_nodes(|k| *k == NodeKind::Gain), 8);

        let seats = FixedAzimuthLayout::new().calculate_positions(8);
        for (participant, source) in manager.participants().iter().zip(&sources) {
            let panner = manager.strategy().input_node(&participant.participant_id).unwrap();
            assert_eq!(graph.edges_from(source.node()), vec![panner]);
            assert_eq!(graph.panner_position(panner), Some(participant.position));
            assert_eq!(participant.position, seats[participant.track_index]);
        }

        let changes: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| StrategyChanged::from_event(e).cloned())
            .collect();
        assert_eq!(
            changes,
            vec![StrategyChanged {
                old_type: PanningType::None,
                new_type: PanningType::Hrtf,
            }]
        );
        assert_eq!(manager.settings().kind, PanningType::Hrtf);
    }

    #[test]
    fn switching_to_the_active_strategy_is_a_no_op() {
        let mut manager = enabled_manager(PanningType::Stereo);
        add_with_source(&mut manager, "a", 0);
        let events = record_events(&mut manager);
        let created = manager.graph().nodes_created();

        manager.switch_strategy(PanningType::Stereo);

        assert_eq!(manager.graph().nodes_created(), created);
        assert!(kinds(&events).is_empty());
    }

    #[test]
    fn disable_then_enable_restores_chains() {
        let mut manager = enabled_manager(PanningType::EqualPower);
        let sources: Vec<(&str, SourceHandle)> = ["a", "b", "c"]
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, add_with_source(&mut manager, id, index)))
            .collect();
        let before: Vec<Position> = sources
            .iter()
            .map(|(id, _)| manager.participant(id).unwrap().position)
            .collect();

        manager.set_enabled(false);
        assert_eq!(manager.graph().live_node_count(), 0);
        for (_, source) in &sources {
            assert!(manager.graph().edges_from(source.node()).is_empty());
        }

        manager.set_enabled(true);
        assert_eq!(manager.graph().live_node_count(), 6);
        for ((id, source), position) in sources.iter().zip(before) {
            assert_eq!(manager.participant(id).unwrap().position, position);

            let input = manager.strategy().input_node(id).unwrap();
            assert_eq!(manager.graph().edges_from(source.node()), vec![input]);
            assert_eq!(manager.graph().panner_position(input), Some(position));
        }
    }

    #[test]
    fn set_enabled_without_change_emits_nothing() {
        let mut manager = enabled_manager(PanningType::None);
        let events = record_events(&mut manager);

        manager.set_enabled(true);
        assert!(kinds(&events).is_empty());

        manager.set_enabled(false);
        assert_eq!(kinds(&events), vec![EventKind::SettingsUpdated]);
    }

    #[test]
    fn synchronize_replaces_membership() {
        let mut manager = enabled_manager(PanningType::Stereo);
        manager.synchronize_with_all_participants(["a", "b"]);
        manager.add_participant(NewParticipant::new("b", 1).with_display_name("Bob"));
        let b_source = SourceHandle::new(manager.graph_mut().create_source());
        manager.connect_participant_source("b", b_source);
        let a_source = SourceHandle::new(manager.graph_mut().create_source());
        manager.connect_participant_source("a", a_source);
        let a_chain = manager.strategy().input_node("a");
        assert!(a_chain.is_some());

        manager.synchronize_with_all_participants(vec!["b".to_string(), "c".to_string()]);

        let ids: Vec<String> = manager.participants().into_iter().map(|p| p.participant_id).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let b = manager.participant("b").unwrap();
        assert_eq!(b.display_name.as_deref(), Some("Bob"));
        assert_eq!(b.source, Some(b_source));
        assert_eq!(b.track_index, 0);

        let c = manager.participant("c").unwrap();
        assert!(c.is_muted);
        assert!(!c.has_source());
        assert_eq!(c.track_index, 1);

        assert!(manager.strategy().input_node("a").is_none());
        assert!(!manager.graph().contains(a_chain.unwrap()));
        let b_input = manager.strategy().input_node("b").unwrap();
        assert_eq!(manager.graph().edges_from(b_source.node()), vec![b_input]);
    }

    #[test]
    fn synchronize_ignores_duplicate_ids() {
        let mut manager = SpatialAudioManager::new(MemoryGraph::new());
        manager.synchronize_with_all_participants(["a", "b", "a"]);
        assert_eq!(manager.participant_count(), 2);
    }

    #[test]
    fn add_and_remove_event_order() {
        let mut manager = SpatialAudioManager::new(MemoryGraph::new());
        manager.add_participant(NewParticipant::new("a", 0));
        let events = record_events(&mut manager);

        manager.add_participant(NewParticipant::new("b", 1));
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::ParticipantMoved,
                EventKind::ParticipantMoved,
                EventKind::ParticipantAdded,
            ]
        );

        events.lock().unwrap().clear();
        manager.remove_participant("a");
        assert_eq!(
            kinds(&events),
            vec![EventKind::ParticipantRemoved, EventKind::ParticipantMoved]
        );
    }

    #[test]
    fn removal_releases_nodes_and_reseats_the_rest() {
        let mut manager = enabled_manager(PanningType::EqualPower);
        add_with_source(&mut manager, "a", 0);
        add_with_source(&mut manager, "b", 1);

        manager.remove_participant("a");

        assert_eq!(manager.graph().live_node_count(), 2);
        let b = manager.participant("b").unwrap();
        assert_eq!(b.position, FixedAzimuthLayout::new().calculate_positions(1)[0]);
        let panner = manager.strategy().input_node("b").unwrap();
        assert_eq!(manager.graph().panner_position(panner), Some(b.position));
    }

    #[test_log::test]
    fn unknown_participants_are_ignored() {
        let mut manager = enabled_manager(PanningType::Stereo);
        let source = SourceHandle::new(manager.graph_mut().create_source());
        let events = record_events(&mut manager);

        manager.remove_participant("ghost");
        manager.connect_participant_source("ghost", source);
        manager.update_participant_mute_status("ghost", true);

        assert!(kinds(&events).is_empty());
        assert_eq!(manager.graph().nodes_created(), 0);
    }

    #[test]
    fn update_settings_emits_once_after_switch() {
        let mut manager = enabled_manager(PanningType::Stereo);
        add_with_source(&mut manager, "a", 0);
        let events = record_events(&mut manager);

        manager.update_settings(
            SettingsUpdate::new()
                .panning(PanningType::Hrtf)
                .master_volume(1.5)
                .listener_position(Position::new(1.0, 0.0, 2.0)),
        );

        assert_eq!(
            kinds(&events),
            vec![EventKind::StrategyChanged, EventKind::SettingsUpdated]
        );
        let settings = manager.settings();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.kind, PanningType::Hrtf);
        assert_eq!(manager.graph().listener().0, Position::new(1.0, 0.0, 2.0));

        let gain = manager.strategy().output_node("a").unwrap();
        assert_eq!(manager.graph().gain(gain), Some(1.0));
    }

    #[test]
    fn disabling_and_switching_together_builds_no_chains() {
        let mut manager = enabled_manager(PanningType::Stereo);
        add_with_source(&mut manager, "a", 0);
        let created = manager.graph().nodes_created();

        manager.update_settings(SettingsUpdate::new().enabled(false).panning(PanningType::Hrtf));

        assert_eq!(manager.graph().nodes_created(), created);
        assert_eq!(manager.graph().live_node_count(), 0);
        assert_eq!(manager.active_strategy(), PanningType::Hrtf);
        assert!(!manager.settings().enabled);
    }

    #[test]
    fn typed_subscription_can_be_removed() {
        let mut manager = SpatialAudioManager::new(MemoryGraph::new());
        let added = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&added);
        let listener = manager.subscribe::<ParticipantAdded, _>(move |event| {
            sink.lock().unwrap().push(event.participant_id.clone());
            Ok(())
        });

        manager.add_participant(NewParticipant::new("a", 0));
        assert!(manager.remove_event_listener(listener));
        manager.add_participant(NewParticipant::new("b", 1));

        assert_eq!(*added.lock().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn disabled_manager_leaves_the_graph_alone() {
        let mut graph = MockGraph::new();
        graph.expect_state().return_const(DeviceState::Running);

        let mut manager = SpatialAudioManager::new(graph);
        manager.add_participant(NewParticipant::new("a", 0));
        manager.synchronize_with_all_participants(["a", "b", "c"]);
        manager.connect_participant_source("b", SourceHandle::new(NodeId::from_raw(42)));
        manager.update_participant_mute_status("c", true);
        manager.update_settings(SettingsUpdate::new().master_volume(0.2));
        manager.remove_participant("a");

        assert_eq!(manager.participant_count(), 2);
        assert!(manager.participant("b").unwrap().has_source());
    }

    #[test]
    fn suspended_device_without_runtime_is_left_alone() {
        let mut manager = SpatialAudioManager::with_settings(
            MemoryGraph::suspended(),
            enabled(PanningType::Stereo),
            LayoutKind::FixedAzimuth,
        );
        add_with_source(&mut manager, "a", 0);
        let source = SourceHandle::new(manager.graph_mut().create_source());

        manager.connect_participant_source("a", source);

        assert_eq!(manager.graph().state(), DeviceState::Suspended);
        assert!(manager.strategy().input_node("a").is_some());
    }

    #[tokio::test]
    async fn connecting_a_source_resumes_the_device() {
        let mut manager = SpatialAudioManager::new(MemoryGraph::suspended());
        manager.add_participant(NewParticipant::new("a", 0));
        let source = SourceHandle::new(manager.graph_mut().create_source());

        manager.connect_participant_source("a", source);

        for _ in 0..10 {
            if manager.graph().state() == DeviceState::Running {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.graph().state(), DeviceState::Running);
    }

    #[tokio::test]
    async fn failed_resume_still_connects_and_retries_on_next_connect() {
        let mut graph = MemoryGraph::suspended();
        graph.fail_next_resume();
        let mut manager = SpatialAudioManager::with_settings(
            graph,
            enabled(PanningType::Stereo),
            LayoutKind::FixedAzimuth,
        );
        manager.add_participant(NewParticipant::new("a", 0));
        let source = SourceHandle::new(manager.graph_mut().create_source());

        manager.connect_participant_source("a", source);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let input = manager.strategy().input_node("a").unwrap();
        assert_eq!(manager.graph().edges_from(source.node()), vec![input]);
        assert_eq!(manager.graph().state(), DeviceState::Suspended);

        manager.connect_participant_source("a", source);
        for _ in 0..10 {
            if manager.graph().state() == DeviceState::Running {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.graph().state(), DeviceState::Running);
        assert_eq!(manager.graph().edges_from(source.node()), vec![input]);
    }

    #[test]
    fn destroy_releases_everything_and_closes() {
        let mut manager = enabled_manager(PanningType::Hrtf);
        add_with_source(&mut manager, "a", 0);
        add_with_source(&mut manager, "b", 1);

        let graph = manager.destroy();

        assert_eq!(graph.state(), DeviceState::Closed);
        assert_eq!(graph.live_node_count(), 0);
        assert_eq!(graph.nodes_released(), 4);
    }

    #[test]
    fn grid_layout_is_selectable() {
        let mut manager = SpatialAudioManager::with_layout(MemoryGraph::new(), LayoutKind::Grid);
        manager.synchronize_with_all_participants(["a", "b"]);

        let xs: Vec<f32> = manager.participants().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![-2.0, 2.0]);
    }
}
