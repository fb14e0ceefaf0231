//! Latest-known-position store.
//!
//! The rotation loop reads the most recent GPS fix when naming a clip; the
//! position source overwrites it whenever an update is accepted. There is no
//! history: the cell holds exactly one value, and `None` is the explicit
//! "no fix yet" sentinel.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Placeholder text used in filenames until the first fix arrives.
pub const NO_FIX_TEXT: &str = "GPS: --,--";

/// A single latitude/longitude reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl PositionFix {
    /// Create a new fix.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Format the fix for filename embedding, at fixed 5-decimal precision.
    #[must_use]
    pub fn text(&self) -> String {
        format!("GPS: {:.5}, {:.5}", self.lat, self.lon)
    }
}

impl std::fmt::Display for PositionFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Great-circle distance between two fixes in meters (haversine).
#[must_use]
pub fn distance_m(a: PositionFix, b: PositionFix) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// A shared, lock-guarded store for the latest known position.
///
/// Cloning the cell is cheap; all clones observe the same value. The writer
/// (position source) and reader (rotation loop) run on different tasks, so
/// access goes through an internal lock rather than relying on incidental
/// scheduling order.
#[derive(Debug, Clone, Default)]
pub struct PositionCell {
    inner: Arc<RwLock<Option<PositionFix>>>,
}

impl PositionCell {
    /// Create an empty cell (no fix yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored fix.
    pub fn update(&self, fix: PositionFix) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(fix);
        }
    }

    /// Get a copy of the latest fix, if any has been received.
    #[must_use]
    pub fn latest(&self) -> Option<PositionFix> {
        self.inner.read().ok().and_then(|guard| *guard)
    }

    /// Get the position text for filename embedding.
    ///
    /// Returns the formatted fix, or the literal placeholder if no fix has
    /// ever been received.
    #[must_use]
    pub fn text(&self) -> String {
        self.latest()
            .map_or_else(|| NO_FIX_TEXT.to_string(), |fix| fix.text())
    }

    /// Check whether any fix has been received.
    #[must_use]
    pub fn has_fix(&self) -> bool {
        self.latest().is_some()
    }
}
