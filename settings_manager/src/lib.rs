//! Configuration management for the spatial audio engine
//!
//! This crate handles loading the engine's start-up configuration
//! from a TOML file layered with environment overrides.

use config::{Config, Environment, File, FileFormat};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use spatial::LayoutKind;
use spatial_core::{
    clamp_volume, Error, ListenerOrientation, PanningType, Position, SpatialAudioSettings,
    DEFAULT_MASTER_VOLUME,
};
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding file values, e.g.
/// `SPATIAL_AUDIO_MASTER_VOLUME=0.4` or `SPATIAL_AUDIO_LISTENER_POSITION__X=1`.
pub const ENV_PREFIX: &str = "SPATIAL_AUDIO";

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Engine start-up settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether spatial processing starts enabled
    pub enabled: bool,

    /// Panning strategy used at start-up
    pub panning: PanningType,

    /// Master volume, clamped to `[0, 1]` when applied
    pub master_volume: f32,

    /// Layout used to seat participants
    pub layout: LayoutKind,

    pub listener_position: Position,

    pub listener_orientation: ListenerOrientation,

    /// Capacity of the channel the async handler forwards events into
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            panning: PanningType::None,
            master_volume: DEFAULT_MASTER_VOLUME,
            layout: LayoutKind::FixedAzimuth,
            listener_position: Position::ORIGIN,
            listener_orientation: ListenerOrientation::default(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Default location of the config file: `<config dir>/spatial_audio/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("spatial_audio").join("config.toml"))
    }

    /// Load from the default file location plus environment overrides.
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Some(path) => Self::from_sources(Some(&path), Some(ENV_PREFIX)),
            None => {
                warn!("Failed to determine config directory, using environment and defaults");
                Self::from_sources(None, Some(ENV_PREFIX))
            }
        }
    }

    /// Load from a specific file plus environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_sources(Some(path.as_ref()), Some(ENV_PREFIX))
    }

    /// Layer defaults, an optional TOML file and optional environment
    /// variables under `env_prefix`, later sources winning.
    pub fn from_sources(path: Option<&Path>, env_prefix: Option<&str>) -> Result<Self, Error> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if path.exists() {
                debug!("Loading config from {:?}", path);
            } else {
                debug!("Config file {:?} not found, using defaults", path);
            }
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: EngineConfig = builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| Error::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        info!(
            "Loaded engine config: {} panning, {} layout, {}",
            config.panning,
            config.layout,
            if config.enabled { "enabled" } else { "disabled" }
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.event_channel_capacity == 0 {
            return Err(Error::Config(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings the manager starts with
    pub fn initial_settings(&self) -> SpatialAudioSettings {
        SpatialAudioSettings {
            enabled: self.enabled,
            kind: self.panning,
            master_volume: clamp_volume(self.master_volume),
            listener_position: self.listener_position,
            listener_orientation: self.listener_orientation,
        }
    }
}
