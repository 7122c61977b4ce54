use crate::{PanningType, Position, SpatialAudioSettings};

/// Closed set of event kinds the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ParticipantAdded,
    ParticipantRemoved,
    ParticipantMoved,
    StrategyChanged,
    SettingsUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::ParticipantAdded,
        EventKind::ParticipantRemoved,
        EventKind::ParticipantMoved,
        EventKind::StrategyChanged,
        EventKind::SettingsUpdated,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::ParticipantAdded => "participantAdded",
            EventKind::ParticipantRemoved => "participantRemoved",
            EventKind::ParticipantMoved => "participantMoved",
            EventKind::StrategyChanged => "strategyChanged",
            EventKind::SettingsUpdated => "settingsUpdated",
        };
        f.write_str(name)
    }
}

/// A participant entered the registry
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantAdded {
    pub participant_id: String,
    pub position: Position,
}

/// A participant left the registry
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRemoved {
    pub participant_id: String,
}

/// A participant was assigned a (possibly unchanged) position
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantMoved {
    pub participant_id: String,
    pub position: Position,
}

/// The active panning strategy was replaced
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyChanged {
    pub old_type: PanningType,
    pub new_type: PanningType,
}

/// Settings changed; carries a snapshot, not a live reference
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsUpdated {
    pub settings: SpatialAudioSettings,
}

/// Events emitted by the spatial audio manager to its subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialEvent {
    ParticipantAdded(ParticipantAdded),
    ParticipantRemoved(ParticipantRemoved),
    ParticipantMoved(ParticipantMoved),
    StrategyChanged(StrategyChanged),
    SettingsUpdated(SettingsUpdated),
}

impl SpatialEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SpatialEvent::ParticipantAdded(_) => EventKind::ParticipantAdded,
            SpatialEvent::ParticipantRemoved(_) => EventKind::ParticipantRemoved,
            SpatialEvent::ParticipantMoved(_) => EventKind::ParticipantMoved,
            SpatialEvent::StrategyChanged(_) => EventKind::StrategyChanged,
            SpatialEvent::SettingsUpdated(_) => EventKind::SettingsUpdated,
        }
    }
}

/// Ties a payload type to its event kind so listeners can subscribe
/// with the concrete payload instead of matching on `SpatialEvent`.
pub trait EventPayload: Sized + 'static {
    const KIND: EventKind;

    fn from_event(event: &SpatialEvent) -> Option<&Self>;

    fn into_event(self) -> SpatialEvent;
}

macro_rules! event_payload {
    ($payload:ident) => {
        impl EventPayload for $payload {
            const KIND: EventKind = EventKind::$payload;

            fn from_event(event: &SpatialEvent) -> Option<&Self> {
                match event {
                    SpatialEvent::$payload(payload) => Some(payload),
                    _ => None,
                }
            }

            fn into_event(self) -> SpatialEvent {
                SpatialEvent::$payload(self)
            }
        }

        impl From<$payload> for SpatialEvent {
            fn from(payload: $payload) -> Self {
                SpatialEvent::$payload(payload)
            }
        }
    };
}

event_payload!(ParticipantAdded);
event_payload!(ParticipantRemoved);
event_payload!(ParticipantMoved);
event_payload!(StrategyChanged);
event_payload!(SettingsUpdated);
