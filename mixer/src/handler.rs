use crate::manager::SpatialAudioManager;
use audio_graph::AudioGraph;
use log::{debug, info, warn};
use spatial_core::{
    Error, EventKind, NewParticipant, PanningType, SettingsUpdate, SourceHandle, SpatialEvent,
};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Commands driving the spatial audio manager from the host application
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialCommand {
    /// Reconcile against the complete current participant list
    SyncParticipants(Vec<String>),
    AddParticipant(NewParticipant),
    RemoveParticipant(String),
    ConnectSource {
        participant_id: String,
        source: SourceHandle,
    },
    SetMuted {
        participant_id: String,
        is_muted: bool,
    },
    Enable,
    Disable,
    SetType(PanningType),
    UpdateSettings(SettingsUpdate),
    /// Tear down the manager and stop the handler
    Shutdown,
}

/// Handler owning the manager, applying commands from the host and
/// forwarding manager events back to it
pub struct SpatialAudioHandler<G: AudioGraph> {
    /// The manager, until shutdown
    manager: Option<SpatialAudioManager<G>>,
    /// The closed graph handed back by the manager on shutdown
    graph: Option<G>,
    /// Channel for receiving commands
    command_rx: mpsc::Receiver<SpatialCommand>,
}

impl<G: AudioGraph> SpatialAudioHandler<G> {
    /// Create a handler that forwards every manager event into `event_tx`
    pub fn new(
        mut manager: SpatialAudioManager<G>,
        command_rx: mpsc::Receiver<SpatialCommand>,
        event_tx: mpsc::Sender<SpatialEvent>,
    ) -> Self {
        for kind in EventKind::ALL {
            let event_tx = event_tx.clone();
            manager.add_event_listener(kind, move |event| {
                match event_tx.try_send(event.clone()) {
                    Ok(()) => Ok(()),
                    Err(TrySendError::Full(event)) => {
                        warn!("Event channel full, dropping {} event", event.kind());
                        Ok(())
                    }
                    Err(TrySendError::Closed(_)) => {
                        Err(anyhow::anyhow!("event channel closed"))
                    }
                }
            });
        }

        Self {
            manager: Some(manager),
            graph: None,
            command_rx,
        }
    }

    pub fn manager(&self) -> Option<&SpatialAudioManager<G>> {
        self.manager.as_ref()
    }

    /// Take the closed graph once the handler has shut down
    pub fn take_graph(&mut self) -> Option<G> {
        self.graph.take()
    }

    /// Run the handler until `Shutdown` is received or the command channel
    /// closes, then destroy the manager
    pub async fn run(&mut self) -> Result<(), Error> {
        if self.manager.is_none() {
            return Err(Error::InvalidState(
                "spatial audio handler already shut down".to_string(),
            ));
        }

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if let SpatialCommand::Shutdown = command {
                        info!("Received shutdown command, exiting spatial audio handler");
                        break;
                    }
                    self.handle_command(command);
                }

                else => {
                    debug!("Spatial command channel closed");
                    break;
                }
            }
        }

        if let Some(manager) = self.manager.take() {
            self.graph = Some(manager.destroy());
        }
        Ok(())
    }

    fn handle_command(&mut self, command: SpatialCommand) {
        let Some(manager) = self.manager.as_mut() else {
            warn!("Ignoring {:?}, manager already destroyed", command);
            return;
        };

        match command {
            SpatialCommand::SyncParticipants(participant_ids) => {
                if participant_ids.is_empty() {
                    debug!("Ignoring empty participant list");
                    return;
                }
                manager.synchronize_with_all_participants(participant_ids);
            }

            SpatialCommand::AddParticipant(participant) => manager.add_participant(participant),

            SpatialCommand::RemoveParticipant(participant_id) => {
                manager.remove_participant(&participant_id)
            }

            SpatialCommand::ConnectSource {
                participant_id,
                source,
            } => manager.connect_participant_source(&participant_id, source),

            SpatialCommand::SetMuted {
                participant_id,
                is_muted,
            } => manager.update_participant_mute_status(&participant_id, is_muted),

            SpatialCommand::Enable => manager.set_enabled(true),

            SpatialCommand::Disable => manager.set_enabled(false),

            SpatialCommand::SetType(kind) => {
                manager.update_settings(SettingsUpdate::new().panning(kind))
            }

            SpatialCommand::UpdateSettings(update) => manager.update_settings(update),

            SpatialCommand::Shutdown => {}
        }
    }
}
