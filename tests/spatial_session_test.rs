use spatial_audio::{
    AudioGraph, DeviceState, EventKind, LayoutKind, MemoryGraph, NewParticipant, PanningType, Position,
    SettingsUpdate, SourceHandle, SpatialAudioManager, SpatialAudioSettings,
};
use std::sync::{Arc, Mutex};

fn enabled_settings(kind: PanningType) -> SpatialAudioSettings {
    SpatialAudioSettings {
        enabled: true,
        kind,
        ..SpatialAudioSettings::default()
    }
}

#[test_log::test]
fn test_meeting_lifecycle() {
    let mut manager = SpatialAudioManager::with_settings(
        MemoryGraph::new(),
        enabled_settings(PanningType::Stereo),
        LayoutKind::FixedAzimuth,
    );

    // Room roster arrives first, media tracks later
    manager.synchronize_with_all_participants(["alice", "bob", "carol"]);
    assert_eq!(manager.participant_count(), 3);
    assert_eq!(manager.graph().live_node_count(), 0);

    let mut sources = Vec::new();
    for id in ["alice", "bob", "carol"] {
        let source = SourceHandle::new(manager.graph_mut().create_source());
        manager.connect_participant_source(id, source);
        sources.push(source);
    }
    assert_eq!(manager.graph().live_node_count(), 6);

    // Stereo pans follow the seats from left to right
    let pans: Vec<f32> = ["alice", "bob", "carol"]
        .iter()
        .map(|id| {
            let panner = manager.strategy().input_node(id).unwrap();
            manager.graph().pan(panner).unwrap()
        })
        .collect();
    assert!(pans[0] < pans[1] && pans[1] < pans[2]);

    // Bob leaves; the roster update reseats the others
    manager.synchronize_with_all_participants(["alice", "carol"]);
    assert_eq!(manager.graph().live_node_count(), 4);
    assert!(manager.graph().edges_from(sources[1].node()).is_empty());

    manager.update_settings(SettingsUpdate::new().panning(PanningType::Hrtf).master_volume(0.4));
    assert_eq!(manager.active_strategy(), PanningType::Hrtf);
    for (id, source) in [("alice", sources[0]), ("carol", sources[2])] {
        let panner = manager.strategy().input_node(id).unwrap();
        let participant = manager.participant(id).unwrap();
        assert_eq!(manager.graph().edges_from(source.node()), vec![panner]);
        assert_eq!(manager.graph().panner_position(panner), Some(participant.position));

        let gain = manager.strategy().output_node(id).unwrap();
        assert_eq!(manager.graph().gain(gain), Some(0.4));
    }

    let graph = manager.destroy();
    assert_eq!(graph.state(), DeviceState::Closed);
    assert_eq!(graph.live_node_count(), 0);
}

#[test]
fn test_every_strategy_builds_one_chain_per_participant() {
    for kind in PanningType::ALL {
        let mut manager = SpatialAudioManager::with_settings(
            MemoryGraph::new(),
            enabled_settings(kind),
            LayoutKind::Grid,
        );
        for index in 0..5 {
            let source = SourceHandle::new(manager.graph_mut().create_source());
            manager.add_participant(NewParticipant::new(format!("p{}", index), index).with_source(source));
        }

        assert_eq!(manager.strategy().chain_count(), 5, "{} strategy", kind);
        for participant in manager.participants() {
            let input = manager.strategy().input_node(&participant.participant_id).unwrap();
            let source = participant.source.unwrap();
            assert_eq!(manager.graph().edges_from(source.node()), vec![input]);
        }
    }
}

#[test]
fn test_listener_settings_reach_the_graph() {
    let mut manager = SpatialAudioManager::with_settings(
        MemoryGraph::new(),
        enabled_settings(PanningType::EqualPower),
        LayoutKind::FixedAzimuth,
    );

    manager.update_settings(SettingsUpdate::new().listener_position(Position::flat(0.5, -0.5)));

    let (position, _) = manager.graph().listener();
    assert_eq!(position, Position::new(0.5, -0.5, 0.0));
}

#[test]
fn test_overflowing_rooms_still_seat_everyone() {
    let mut manager = SpatialAudioManager::new(MemoryGraph::new());
    let ids: Vec<String> = (0..11).map(|i| format!("p{}", i)).collect();
    manager.synchronize_with_all_participants(ids);

    let participants = manager.participants();
    assert_eq!(participants.len(), 11);
    assert_eq!(participants[8].position, participants[0].position);
}

#[test]
fn test_events_report_every_change() {
    let mut manager = SpatialAudioManager::new(MemoryGraph::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let seen = Arc::clone(&seen);
        manager.add_event_listener(kind, move |event| {
            seen.lock().unwrap().push(event.kind());
            Ok(())
        });
    }

    manager.add_participant(NewParticipant::new("a", 0));
    manager.set_enabled(true);
    manager.switch_strategy(PanningType::Stereo);
    manager.remove_participant("a");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            EventKind::ParticipantMoved,
            EventKind::ParticipantAdded,
            EventKind::SettingsUpdated,
            EventKind::StrategyChanged,
            EventKind::ParticipantRemoved,
        ]
    );
}
