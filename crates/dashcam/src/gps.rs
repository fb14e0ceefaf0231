//! Position sources.
//!
//! This module defines the trait a position backend must fulfill and the
//! gpsd implementation used on Linux. A source pushes accepted fixes into a
//! shared [`PositionCell`]; it never blocks or fails the recording loop. If
//! the subscription cannot be established the service degrades to the
//! placeholder position text.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::GpsConfig;
use crate::error::{Error, Result};
use crate::position::{distance_m, PositionCell, PositionFix};

/// gpsd watch command enabling newline-delimited JSON reports.
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// A trait for position backends.
///
/// Implementors subscribe to some stream of fixes and write accepted ones
/// into the provided cell until stopped.
#[async_trait::async_trait]
pub trait PositionSource: Send + Sync {
    /// The name of this position source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Start the source and begin updating the cell.
    ///
    /// Returns once the subscription is established; updates continue on a
    /// background task until [`PositionSource::stop`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    async fn start(&mut self, cell: PositionCell) -> Result<()>;

    /// Stop the source.
    fn stop(&self);

    /// Check if the source is currently running.
    fn is_running(&self) -> bool;
}

/// Gate that throttles position updates to a minimum interval and a minimum
/// displacement, mirroring a typical location-subscription contract
/// (defaults: 2 s / 5 m).
#[derive(Debug)]
pub struct UpdateFilter {
    min_interval: Duration,
    min_displacement_m: f64,
    last: Option<(Instant, PositionFix)>,
}

impl UpdateFilter {
    /// Create a new filter.
    #[must_use]
    pub fn new(min_interval: Duration, min_displacement_m: f64) -> Self {
        Self {
            min_interval,
            min_displacement_m,
            last: None,
        }
    }

    /// Decide whether to accept a fix arriving now.
    pub fn accept(&mut self, fix: PositionFix) -> bool {
        self.accept_at(fix, Instant::now())
    }

    fn accept_at(&mut self, fix: PositionFix, now: Instant) -> bool {
        if let Some((at, prev)) = self.last {
            if now.duration_since(at) < self.min_interval {
                return false;
            }
            if distance_m(prev, fix) < self.min_displacement_m {
                return false;
            }
        }
        self.last = Some((now, fix));
        true
    }
}

/// A single report from gpsd's JSON stream.
///
/// Only the fields needed to extract a fix are modeled; everything else in
/// the report is ignored.
#[derive(Debug, Deserialize)]
struct GpsdReport {
    class: String,
    #[serde(default)]
    mode: Option<u8>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Extract a usable fix from one line of the gpsd stream.
///
/// Returns `None` for non-TPV reports, reports without a 2-D or better mode,
/// or reports missing coordinates.
fn parse_report(line: &str) -> Option<PositionFix> {
    let report: GpsdReport = serde_json::from_str(line).ok()?;
    if report.class != "TPV" || report.mode? < 2 {
        return None;
    }
    Some(PositionFix::new(report.lat?, report.lon?))
}

/// Position source backed by a gpsd daemon speaking JSON over TCP.
#[derive(Debug)]
pub struct GpsdSource {
    addr: String,
    min_interval: Duration,
    min_displacement_m: f64,
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
}

impl GpsdSource {
    /// Create a source from the GPS section of the configuration.
    #[must_use]
    pub fn new(config: &GpsConfig) -> Self {
        Self {
            addr: format!("{}:{}", config.host, config.port),
            min_interval: Duration::from_secs(config.min_interval_secs),
            min_displacement_m: config.min_displacement_m,
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
        }
    }
}

#[async_trait::async_trait]
impl PositionSource for GpsdSource {
    fn name(&self) -> &'static str {
        "gpsd"
    }

    async fn start(&mut self, cell: PositionCell) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(Error::position_source(self.name(), "already running"));
        }

        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| Error::position_source(self.name(), e.to_string()))?;
        stream
            .write_all(WATCH_COMMAND)
            .await
            .map_err(|e| Error::position_source(self.name(), e.to_string()))?;

        info!(addr = %self.addr, "gpsd watch established");
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let stop_signal = Arc::clone(&self.stop_signal);
        let mut filter = UpdateFilter::new(self.min_interval, self.min_displacement_m);

        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                tokio::select! {
                    () = stop_signal.notified() => {
                        debug!("gpsd source stopping");
                        break;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if let Some(fix) = parse_report(&line) {
                                if filter.accept(fix) {
                                    debug!(%fix, "position updated");
                                    cell.update(fix);
                                }
                            }
                        }
                        Ok(None) => {
                            warn!("gpsd closed the connection; position updates stopped");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "gpsd read failed; position updates stopped");
                            break;
                        }
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    fn stop(&self) {
        // notify_one stores a permit, so a stop issued before the reader
        // task first parks in the select is not lost.
        self.stop_signal.notify_one();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
