use audio_graph::AudioGraph;
use log::{error, info};
use mixer::{SpatialAudioHandler, SpatialAudioManager, SpatialCommand};
use settings_manager::EngineConfig;
use spatial_core::{Error, SpatialEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// A running spatial audio session: a manager driven by a background
/// handler task, talked to over channels.
pub struct SpatialAudioEngine<G: AudioGraph + 'static> {
    command_tx: mpsc::Sender<SpatialCommand>,
    event_rx: mpsc::Receiver<SpatialEvent>,
    task: JoinHandle<Result<Option<G>, Error>>,
}

impl<G: AudioGraph + 'static> SpatialAudioEngine<G> {
    /// Build a manager from `config` and spawn its handler on the current
    /// tokio runtime.
    pub fn start(config: &EngineConfig, graph: G) -> Self {
        let manager = SpatialAudioManager::with_settings(graph, config.initial_settings(), config.layout);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let mut handler = SpatialAudioHandler::new(manager, command_rx, event_tx);

        let task = tokio::spawn(async move {
            handler.run().await?;
            Ok::<_, Error>(handler.take_graph())
        });

        info!("Spatial audio engine started");
        Self {
            command_tx,
            event_rx,
            task,
        }
    }

    /// Queue a command for the handler
    pub async fn send(&self, command: SpatialCommand) -> Result<(), Error> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| Error::InvalidState(format!("Spatial audio handler stopped: {}", e)))
    }

    /// Receive the next manager event
    pub async fn next_event(&mut self) -> Option<SpatialEvent> {
        self.event_rx.recv().await
    }

    /// Receive an already queued event without waiting
    pub fn try_next_event(&mut self) -> Option<SpatialEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Shut the handler down and hand back the closed graph
    pub async fn shutdown(self) -> Result<G, Error> {
        if let Err(e) = self.command_tx.send(SpatialCommand::Shutdown).await {
            error!("Failed to send shutdown command: {}", e);
        }

        let graph = self
            .task
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("Spatial audio handler task failed: {}", e)))??;

        info!("Spatial audio engine stopped");
        graph.ok_or_else(|| Error::InvalidState("Spatial audio graph already taken".to_string()))
    }
}
