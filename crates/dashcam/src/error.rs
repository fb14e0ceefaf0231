//! Error types for dashcam.
//!
//! This module defines all error types used throughout the dashcam crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for dashcam operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Recorder Errors ===
    /// The recorder failed to start a clip.
    #[error("failed to start recorder '{name}': {message}")]
    RecorderStart {
        /// Name of the recorder backend.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The recorder failed to stop cleanly.
    #[error("failed to stop recorder '{name}': {message}")]
    RecorderStop {
        /// Name of the recorder backend.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A clip was already being recorded when a new one was requested.
    #[error("recorder is already recording")]
    AlreadyRecording,

    /// Too many consecutive clip starts failed; the service gave up.
    #[error("recording aborted after {count} consecutive start failures")]
    TooManyStartFailures {
        /// Number of consecutive failures observed.
        count: u32,
    },

    // === Position Errors ===
    /// The position source failed to start or lost its connection.
    #[error("position source '{name}' failed: {message}")]
    PositionSource {
        /// Name of the position source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === Daemon Errors ===
    /// A daemon is already running.
    #[error("daemon already running (pid {pid})")]
    DaemonAlreadyRunning {
        /// Process id recorded in the pid file.
        pid: i32,
    },

    /// The daemon is not running.
    #[error("daemon is not running")]
    DaemonNotRunning,

    /// The pid file could not be read or written.
    #[error("pid file error at {path}: {message}")]
    PidFile {
        /// Path to the pid file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for dashcam operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a recorder start error.
    #[must_use]
    pub fn recorder_start(name: &'static str, message: impl Into<String>) -> Self {
        Self::RecorderStart {
            name,
            message: message.into(),
        }
    }

    /// Create a recorder stop error.
    #[must_use]
    pub fn recorder_stop(name: &'static str, message: impl Into<String>) -> Self {
        Self::RecorderStop {
            name,
            message: message.into(),
        }
    }

    /// Create a position source error.
    #[must_use]
    pub fn position_source(name: &'static str, message: impl Into<String>) -> Self {
        Self::PositionSource {
            name,
            message: message.into(),
        }
    }

    /// Create a pid file error.
    #[must_use]
    pub fn pid_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PidFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error indicates the daemon is not running.
    #[must_use]
    pub fn is_daemon_not_running(&self) -> bool {
        matches!(self, Self::DaemonNotRunning)
    }

    /// Check if this error came from the recorder backend.
    #[must_use]
    pub fn is_recorder_error(&self) -> bool {
        matches!(
            self,
            Self::RecorderStart { .. } | Self::RecorderStop { .. } | Self::AlreadyRecording
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DaemonNotRunning;
        assert_eq!(err.to_string(), "daemon is not running");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_is_daemon_not_running() {
        assert!(Error::DaemonNotRunning.is_daemon_not_running());
        assert!(!Error::internal("test").is_daemon_not_running());
    }

    #[test]
    fn test_error_is_recorder_error() {
        assert!(Error::recorder_start("ffmpeg", "spawn failed").is_recorder_error());
        assert!(Error::recorder_stop("ffmpeg", "timeout").is_recorder_error());
        assert!(Error::AlreadyRecording.is_recorder_error());
        assert!(!Error::DaemonNotRunning.is_recorder_error());
    }

    #[test]
    fn test_recorder_start_error_display() {
        let err = Error::recorder_start("ffmpeg", "binary not found");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("binary not found"));
    }

    #[test]
    fn test_recorder_stop_error_display() {
        let err = Error::recorder_stop("ffmpeg", "timeout");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_position_source_error_display() {
        let err = Error::position_source("gpsd", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("gpsd"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_daemon_already_running_display() {
        let err = Error::DaemonAlreadyRunning { pid: 4242 };
        assert!(err.to_string().contains("4242"));
    }

    #[test]
    fn test_pid_file_error_display() {
        let err = Error::pid_file("/run/dashcam.pid", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("/run/dashcam.pid"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_too_many_start_failures_display() {
        let err = Error::TooManyStartFailures { count: 5 };
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "clip_duration_secs must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("clip_duration_secs"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("/root/forbidden"));
    }
}
