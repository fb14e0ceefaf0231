//! Configuration management for dashcam.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "dashcam";

/// Default clip directory name inside the user's videos directory.
const CLIP_DIR_NAME: &str = "Dashcam";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DASHCAM_`, sections separated
///    by `__`, e.g. `DASHCAM_STORAGE__MAX_FILES`)
/// 2. TOML config file at `~/.config/dashcam/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clip storage configuration.
    pub storage: StorageConfig,
    /// Recording configuration.
    pub recording: RecordingConfig,
    /// GPS configuration.
    pub gps: GpsConfig,
    /// Daemon configuration.
    pub daemon: DaemonConfig,
}

/// Clip storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where clips are written.
    /// Defaults to `~/Videos/Dashcam` (or `<data dir>/dashcam/clips`).
    pub output_dir: Option<PathBuf>,
    /// Maximum number of clips to retain on disk.
    pub max_files: usize,
}

/// Recording configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Duration of each clip in seconds.
    pub clip_duration_secs: u64,
    /// Video frame width in pixels.
    pub width: u32,
    /// Video frame height in pixels.
    pub height: u32,
    /// Video frame rate.
    pub frame_rate: u32,
    /// Video encoding bitrate in bits per second.
    pub video_bitrate: u32,
    /// Video capture device.
    pub video_device: String,
    /// Audio capture device (ALSA name).
    pub audio_device: String,
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: PathBuf,
    /// Number of consecutive clip-start failures tolerated before the
    /// daemon gives up.
    pub max_start_failures: u32,
}

/// GPS configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    /// Enable the gpsd position source.
    pub enabled: bool,
    /// gpsd host.
    pub host: String,
    /// gpsd TCP port.
    pub port: u16,
    /// Minimum seconds between accepted position updates.
    pub min_interval_secs: u64,
    /// Minimum displacement in meters between accepted position updates.
    pub min_displacement_m: f64,
}

/// Daemon-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Path to the PID file.
    /// Defaults to `~/.local/share/dashcam/dashcam.pid`
    pub pid_file_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: None, // Will be resolved to default at runtime
            max_files: 20,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            clip_duration_secs: 180,
            width: 1280,
            height: 720,
            frame_rate: 30,
            video_bitrate: 5_000_000,
            video_device: "/dev/video0".to_string(),
            audio_device: "default".to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            max_start_failures: 5,
        }
    }
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 2947,
            min_interval_secs: 2,
            min_displacement_m: 5.0,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `DASHCAM_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("DASHCAM_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.recording.clip_duration_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "clip_duration_secs must be greater than 0".to_string(),
            });
        }

        if self.recording.width == 0 || self.recording.height == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "video size {}x{} is invalid",
                    self.recording.width, self.recording.height
                ),
            });
        }

        if self.recording.frame_rate == 0 {
            return Err(Error::ConfigValidation {
                message: "frame_rate must be greater than 0".to_string(),
            });
        }

        if self.recording.video_bitrate == 0 {
            return Err(Error::ConfigValidation {
                message: "video_bitrate must be greater than 0".to_string(),
            });
        }

        if self.storage.max_files == 0 {
            return Err(Error::ConfigValidation {
                message: "max_files must be greater than 0".to_string(),
            });
        }

        if self.gps.min_displacement_m < 0.0 {
            return Err(Error::ConfigValidation {
                message: "min_displacement_m must not be negative".to_string(),
            });
        }

        Ok(())
    }

    /// Get the clip output directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.storage.output_dir.clone().unwrap_or_else(|| {
            dirs::video_dir()
                .map_or_else(|| Self::default_data_dir().join("clips"), |videos| {
                    videos.join(CLIP_DIR_NAME)
                })
        })
    }

    /// Get the PID file path, resolving defaults if not set.
    #[must_use]
    pub fn pid_file_path(&self) -> PathBuf {
        self.daemon
            .pid_file_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("dashcam.pid"))
    }

    /// Get the clip duration as a Duration.
    #[must_use]
    pub fn clip_duration(&self) -> Duration {
        Duration::from_secs(self.recording.clip_duration_secs)
    }

    /// Get the minimum GPS update interval as a Duration.
    #[must_use]
    pub fn gps_min_interval(&self) -> Duration {
        Duration::from_secs(self.gps.min_interval_secs)
    }

    /// Get the gpsd address as `host:port`.
    #[must_use]
    pub fn gpsd_addr(&self) -> String {
        format!("{}:{}", self.gps.host, self.gps.port)
    }
}
