//! Recorder backends.
//!
//! A [`ClipRecorder`] owns at most one live recording session at a time and
//! must fully release it before a new one may begin. The shipped backend
//! drives an `ffmpeg` child process; stopping sends SIGINT so the MP4
//! container is finalized, with a kill fallback if the process does not
//! exit within the grace period.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::config::RecordingConfig;
use crate::error::{Error, Result};

/// How long an exiting ffmpeg child is given to finalize the container
/// before being killed.
const STOP_GRACE: Duration = Duration::from_secs(3);

/// How long after spawn to wait before checking for immediate exit
/// (missing device, bad arguments).
const SPAWN_CHECK_DELAY: Duration = Duration::from_millis(150);

/// Encoding and capture parameters for a recorder session.
///
/// Defaults follow the MPEG-4 / H.264 5 Mbps / 30 fps / 1280x720 / AAC
/// profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderParams {
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
}

impl From<&RecordingConfig> for RecorderParams {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
            video_bitrate: config.video_bitrate,
            video_device: config.video_device.clone(),
            audio_device: config.audio_device.clone(),
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }
}

impl Default for RecorderParams {
    fn default() -> Self {
        Self::from(&RecordingConfig::default())
    }
}

/// A trait for recorder backends.
///
/// Implementors own the underlying recording resource exclusively. The
/// session lifecycle is strict: `start` fails if a session is already live,
/// and `stop` must release the resource on every path.
#[async_trait::async_trait]
pub trait ClipRecorder: Send {
    /// The name of this recorder backend (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Start recording into the given output file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRecording`] if a session is live, or a
    /// start error if the backend fails to begin recording.
    async fn start(&mut self, output: &Path) -> Result<()>;

    /// Stop the current session and release the resource.
    ///
    /// A no-op when no session is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be stopped cleanly. The
    /// resource is released even on the error path.
    async fn stop(&mut self) -> Result<()>;

    /// Check if a session is currently live.
    fn is_recording(&self) -> bool;
}

/// Recorder backend driving an ffmpeg child process.
#[derive(Debug)]
pub struct FfmpegRecorder {
    params: RecorderParams,
    child: Option<Child>,
}

impl FfmpegRecorder {
    /// Create a recorder with the given parameters.
    #[must_use]
    pub fn new(params: RecorderParams) -> Self {
        Self {
            params,
            child: None,
        }
    }

    /// Build the ffmpeg argument list for recording into `output`.
    #[must_use]
    pub fn command_args(params: &RecorderParams, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            // Video capture
            "-f".to_string(),
            "v4l2".to_string(),
            "-framerate".to_string(),
            params.frame_rate.to_string(),
            "-video_size".to_string(),
            format!("{}x{}", params.width, params.height),
            "-i".to_string(),
            params.video_device.clone(),
            // Audio capture
            "-f".to_string(),
            "alsa".to_string(),
            "-i".to_string(),
            params.audio_device.clone(),
            // Encoding
            "-c:v".to_string(),
            "libx264".to_string(),
            "-b:v".to_string(),
            params.video_bitrate.to_string(),
            "-r".to_string(),
            params.frame_rate.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            // Container
            "-f".to_string(),
            "mp4".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait::async_trait]
impl ClipRecorder for FfmpegRecorder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn start(&mut self, output: &Path) -> Result<()> {
        if self.child.is_some() {
            return Err(Error::AlreadyRecording);
        }

        let args = Self::command_args(&self.params, output);
        debug!(ffmpeg = %self.params.ffmpeg_path.display(), ?args, "spawning recorder");

        let mut child = Command::new(&self.params.ffmpeg_path)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::recorder_start(self.name(), e.to_string()))?;

        // Catch configurations that die instantly (missing device, bad
        // binary) so the caller sees a start failure, not a zero-length clip.
        tokio::time::sleep(SPAWN_CHECK_DELAY).await;
        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(Error::recorder_start(
                    self.name(),
                    format!("exited immediately: {status}"),
                ));
            }
            Ok(None) => {}
            Err(e) => {
                return Err(Error::recorder_start(self.name(), e.to_string()));
            }
        }

        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        // SIGINT asks ffmpeg to finish writing the container trailer.
        if let Some(id) = child.id() {
            #[allow(clippy::cast_possible_wrap)]
            if let Err(e) = kill(Pid::from_raw(id as i32), Signal::SIGINT) {
                warn!(error = %e, "failed to signal recorder; killing");
            }
        }

        match tokio::time::timeout(STOP_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "recorder exited");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::recorder_stop(self.name(), e.to_string())),
            Err(_elapsed) => {
                // Grace period expired; force termination and reap.
                child
                    .kill()
                    .await
                    .map_err(|e| Error::recorder_stop(self.name(), e.to_string()))?;
                Err(Error::recorder_stop(
                    self.name(),
                    format!("did not exit within {STOP_GRACE:?}; killed"),
                ))
            }
        }
    }

    fn is_recording(&self) -> bool {
        self.child.is_some()
    }
}
