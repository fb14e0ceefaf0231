//! The recording service.
//!
//! [`DashcamService`] owns the recorder exclusively and drives the clip
//! rotation loop: every `clip_duration` it stops the current session, names
//! a new output file from the wall clock and the latest position, starts the
//! next session, and runs the retention prune. All rotation steps execute on
//! this one task; position updates arrive through the shared
//! [`PositionCell`], so the ordering guarantees are explicit rather than
//! incidental.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::clip::clip_file_name;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::position::PositionCell;
use crate::recorder::ClipRecorder;
use crate::storage::ClipStore;

/// A cloneable handle used to stop the service from another task
/// (signal handler, tests).
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Check whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        // Register before checking the flag so a concurrent shutdown()
        // cannot slip between the check and the await.
        let notified = self.inner.notify.notified();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }
}

/// The recording service: rotation loop plus retention.
#[derive(Debug)]
pub struct DashcamService<R: ClipRecorder> {
    recorder: R,
    store: ClipStore,
    position: PositionCell,
    clip_duration: Duration,
    max_files: usize,
    max_start_failures: u32,
}

impl<R: ClipRecorder> DashcamService<R> {
    /// Create a service from the configuration, a recorder backend, and the
    /// shared position cell.
    #[must_use]
    pub fn new(config: &Config, recorder: R, position: PositionCell) -> Self {
        Self {
            recorder,
            store: ClipStore::new(config.output_dir()),
            position,
            clip_duration: config.clip_duration(),
            max_files: config.storage.max_files,
            max_start_failures: config.recording.max_start_failures,
        }
    }

    /// Run the rotation loop until shutdown is requested.
    ///
    /// A failed clip start is retried at the next rotation boundary; after
    /// `max_start_failures` consecutive failures the service gives up and
    /// returns an error instead of spinning.
    ///
    /// # Errors
    ///
    /// Returns an error when too many consecutive clip starts fail. On every
    /// exit path the recorder session is released.
    pub async fn run(mut self, shutdown: ShutdownHandle) -> Result<()> {
        info!(
            dir = %self.store.dir().display(),
            clip_secs = self.clip_duration.as_secs(),
            max_files = self.max_files,
            "recording started"
        );

        let mut consecutive_failures: u32 = 0;
        while !shutdown.is_shutdown() {
            match self.rotate().await {
                Ok(path) => {
                    consecutive_failures = 0;
                    info!(path = %path.display(), "recording clip");
                    match self.store.prune(self.max_files) {
                        Ok(0) => {}
                        Ok(deleted) => info!(deleted, "pruned old clips"),
                        Err(e) => warn!(error = %e, "retention cleanup failed"),
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    error!(
                        error = %e,
                        attempt = consecutive_failures,
                        "failed to start clip; will retry at next rotation"
                    );
                    if consecutive_failures >= self.max_start_failures {
                        self.teardown().await;
                        return Err(Error::TooManyStartFailures {
                            count: consecutive_failures,
                        });
                    }
                }
            }

            tokio::select! {
                () = tokio::time::sleep(self.clip_duration) => {}
                () = shutdown.wait() => break,
            }
        }

        self.teardown().await;
        info!("recording stopped");
        Ok(())
    }

    /// One rotation boundary: finalize the current clip and start the next.
    async fn rotate(&mut self) -> Result<PathBuf> {
        // A stop failure must never block starting the next clip.
        if let Err(e) = self.recorder.stop().await {
            warn!(error = %e, "recorder teardown failed; continuing");
        }

        self.store.ensure_dir()?;

        let name = clip_file_name(Local::now(), &self.position.text());
        let path = self.store.clip_path(&name);
        self.recorder.start(&path).await?;
        Ok(path)
    }

    /// Release the recorder session. Errors are logged and swallowed.
    async fn teardown(&mut self) {
        if let Err(e) = self.recorder.stop().await {
            warn!(error = %e, "recorder teardown failed during shutdown");
        }
    }
}
