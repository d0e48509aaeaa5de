//! Corner-level performance analysis over racing telemetry.
//!
//! The core is four pure computations: corner detection from position
//! geometry, cross-driver segment alignment by positional ratio, kinematic
//! metric extraction from telemetry windows, and lap-by-lap running-order
//! reconstruction. Around them sits an async pipeline that fetches from the
//! upstream timing API per driver, concurrently, with latest-request-wins
//! staleness handling.

pub mod align;
pub mod config;
pub mod corners;
pub mod error;
pub mod kinematics;
pub mod pipeline;
pub mod source;
pub mod standings;
pub mod types;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::AnalysisService;
pub use source::{DataSource, FetchError, HttpDataSource};
pub use types::{
    Corner, CornerCatalog, DriverCornerMetrics, DriverNumber, LapRecord, PositionSample,
    PositionTableEntry, SessionKey, TelemetrySample, TracePoint, TrackPoint,
};
