use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Car number as painted on the car. Stable within a season, unique within
/// a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverNumber(pub u32);

impl fmt::Display for DriverNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upstream identifier for one session (practice, qualifying, race).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub u32);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One GPS-derived car position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub t: DateTime<Utc>,
    /// Track-plane x in the feed's local coordinate system (roughly decimeters)
    pub x: f64,
    /// Track-plane y
    pub y: f64,
    /// Elevation
    pub z: f64,
}

impl PositionSample {
    /// The feed emits `(0, 0)` when the car has no fix. Those samples carry
    /// no geometry and must be dropped before any analysis.
    pub fn is_sentinel(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// One car-telemetry sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub t: DateTime<Utc>,
    /// Speed in km/h, never negative
    pub speed: f64,
    /// Throttle pedal position, 0..=100
    pub throttle: f64,
    /// Brake pedal position, 0..=100
    pub brake: f64,
    pub gear: i32,
    pub rpm: f64,
    pub drs: i32,
}

/// One row of the session lap table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub driver: DriverNumber,
    pub lap_number: u32,
    /// Wall-clock start of the lap; the feed omits it for some first laps
    pub start_time: Option<DateTime<Utc>>,
    pub duration_s: Option<f64>,
    pub is_pit_out_lap: bool,
    pub sector1_s: Option<f64>,
    pub sector2_s: Option<f64>,
    pub sector3_s: Option<f64>,
}

impl LapRecord {
    /// Duration if this lap counts for timing purposes. A lap with no
    /// duration, or run out of the pit lane, is excluded from both
    /// fastest-lap selection and cumulative-time accumulation.
    pub fn timed_duration(&self) -> Option<f64> {
        if self.is_pit_out_lap {
            return None;
        }
        self.duration_s
    }
}

/// Plain 2D point used for corner centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

/// A corner detected on the reference lap.
///
/// `index` is a position within the reference sample sequence, not an
/// official circuit corner number. It orders corners by lap progress and is
/// only meaningful for the lap the catalog was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub index: usize,
    pub center: TrackPoint,
    /// Reference-lap samples around the corner, ±8 % of the lap
    pub reference_window: Vec<PositionSample>,
}

/// Corner catalog for one reference lap, the anchor every cross-driver
/// alignment is computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerCatalog {
    pub session: SessionKey,
    pub reference_driver: DriverNumber,
    /// Length of the (downsampled) reference sample sequence
    pub sample_count: usize,
    pub corners: Vec<Corner>,
}

/// One point of an apex-centered speed trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    /// Signed distance from the apex in meters, negative before it
    pub distance_m: f64,
    /// Speed in km/h
    pub speed: f64,
}

/// Corner-level performance metrics for one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverCornerMetrics {
    pub driver: DriverNumber,
    pub entry_speed: f64,
    pub min_speed: f64,
    pub exit_speed: f64,
    pub braking_distance_m: f64,
    pub throttle_on_distance_m: f64,
    pub trace: Vec<TracePoint>,
}

/// Running-order entry: where a driver ranked after completing a lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTableEntry {
    pub lap_number: u32,
    pub driver: DriverNumber,
    /// 1-indexed rank
    pub position: u32,
}
