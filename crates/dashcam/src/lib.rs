//! `dashcam` - A rolling clip recorder with GPS-tagged filenames
//!
//! This library provides the core functionality for recording continuous
//! fixed-duration video clips, stamping each filename with the latest GPS
//! fix, and bounding on-disk retention by deleting the oldest clips.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clip;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gps;
pub mod logging;
pub mod position;
pub mod recorder;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use position::{PositionCell, PositionFix};
pub use recorder::{ClipRecorder, FfmpegRecorder, RecorderParams};
pub use service::{DashcamService, ShutdownHandle};
pub use storage::{ClipStore, ClipStoreStats};
