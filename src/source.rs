//! Boundary to the upstream timing and telemetry API.
//!
//! The trait keeps the analysis service injectable for tests; the real
//! implementation speaks the query API over HTTP with reqwest. Wire rows are
//! decoded into the crate's value types here so nothing upstream-shaped
//! leaks into the analysis modules.

use crate::types::{DriverNumber, LapRecord, PositionSample, SessionKey, TelemetrySample};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read access to the session data source.
///
/// All three queries are independent reads and may run concurrently; the
/// `Send` bound on the futures keeps them spawnable.
pub trait DataSource: Send + Sync {
    /// Ordered position fixes for one driver in a time window, sentinel
    /// (no-fix) samples already removed.
    fn position_samples(
        &self,
        session: SessionKey,
        driver: DriverNumber,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<PositionSample>, FetchError>> + Send;

    /// Ordered car telemetry for one driver in a time window.
    fn telemetry_samples(
        &self,
        session: SessionKey,
        driver: DriverNumber,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TelemetrySample>, FetchError>> + Send;

    /// The session lap table, optionally narrowed to one driver.
    fn lap_records(
        &self,
        session: SessionKey,
        driver: Option<DriverNumber>,
    ) -> impl Future<Output = Result<Vec<LapRecord>, FetchError>> + Send;
}

/// Thin the sequence with a uniform stride so geometric analysis stays
/// bounded. Keeps every stride-th sample as-is; no smoothing, per the
/// upstream contract.
pub fn downsample<T: Clone>(samples: &[T], target: usize) -> Vec<T> {
    if target == 0 || samples.len() <= target {
        return samples.to_vec();
    }
    let stride = samples.len().div_ceil(target);
    samples.iter().step_by(stride).cloned().collect()
}

// ---------- Wire rows ----------

#[derive(Debug, Deserialize)]
struct LocationRow {
    date: DateTime<Utc>,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize)]
struct CarDataRow {
    date: DateTime<Utc>,
    speed: f64,
    throttle: f64,
    brake: f64,
    n_gear: i32,
    rpm: f64,
    drs: i32,
}

#[derive(Debug, Deserialize)]
struct LapRow {
    driver_number: u32,
    lap_number: u32,
    date_start: Option<DateTime<Utc>>,
    lap_duration: Option<f64>,
    #[serde(default)]
    is_pit_out_lap: bool,
    duration_sector_1: Option<f64>,
    duration_sector_2: Option<f64>,
    duration_sector_3: Option<f64>,
}

// ---------- HTTP implementation ----------

pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    async fn get_rows<R: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<R>, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "querying data source");
        let rows = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<R>>()
            .await?;
        Ok(rows)
    }
}

impl DataSource for HttpDataSource {
    async fn position_samples(
        &self,
        session: SessionKey,
        driver: DriverNumber,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PositionSample>, FetchError> {
        let rows: Vec<LocationRow> = self
            .get_rows(
                "location",
                &[
                    ("session_key", session.to_string()),
                    ("driver_number", driver.0.to_string()),
                    ("date>", start.to_rfc3339()),
                    ("date<", end.to_rfc3339()),
                ],
            )
            .await?;

        let total = rows.len();
        let samples: Vec<PositionSample> = rows
            .into_iter()
            .map(|r| PositionSample { t: r.date, x: r.x, y: r.y, z: r.z })
            .filter(|s| !s.is_sentinel())
            .collect();
        if samples.len() < total {
            warn!(
                driver = %driver,
                dropped = total - samples.len(),
                "dropped no-fix position samples"
            );
        }
        Ok(samples)
    }

    async fn telemetry_samples(
        &self,
        session: SessionKey,
        driver: DriverNumber,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TelemetrySample>, FetchError> {
        let rows: Vec<CarDataRow> = self
            .get_rows(
                "car_data",
                &[
                    ("session_key", session.to_string()),
                    ("driver_number", driver.0.to_string()),
                    ("date>", start.to_rfc3339()),
                    ("date<", end.to_rfc3339()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TelemetrySample {
                t: r.date,
                speed: r.speed,
                throttle: r.throttle,
                brake: r.brake,
                gear: r.n_gear,
                rpm: r.rpm,
                drs: r.drs,
            })
            .collect())
    }

    async fn lap_records(
        &self,
        session: SessionKey,
        driver: Option<DriverNumber>,
    ) -> Result<Vec<LapRecord>, FetchError> {
        let mut query = vec![("session_key", session.to_string())];
        if let Some(d) = driver {
            query.push(("driver_number", d.0.to_string()));
        }
        let rows: Vec<LapRow> = self.get_rows("laps", &query).await?;

        Ok(rows
            .into_iter()
            .map(|r| LapRecord {
                driver: DriverNumber(r.driver_number),
                lap_number: r.lap_number,
                start_time: r.date_start,
                duration_s: r.lap_duration,
                is_pit_out_lap: r.is_pit_out_lap,
                sector1_s: r.duration_sector_1,
                sector2_s: r.duration_sector_2,
                sector3_s: r.duration_sector_3,
            })
            .collect())
    }
}
