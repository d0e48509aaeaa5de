//! Request-scoped analysis pipeline.
//!
//! Every public operation runs under a generation number taken when the
//! request starts. Per-driver fetches run concurrently; once they resolve,
//! the result is applied only if no newer request has started in the
//! meantime, so a superseded selection can never overwrite a fresh one.
//! Supersession is advisory cancellation: the stale work simply finishes
//! into a discarded result.

use crate::align::align_segment;
use crate::config::AnalysisConfig;
use crate::corners::detect_corners;
use crate::error::AnalysisError;
use crate::kinematics::extract_metrics;
use crate::source::{downsample, DataSource};
use crate::standings::{fastest_lap, reconstruct_positions};
use crate::types::{
    CornerCatalog, DriverCornerMetrics, DriverNumber, LapRecord, PositionTableEntry, SessionKey,
};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

pub struct AnalysisService<S> {
    source: S,
    config: AnalysisConfig,
    generation: AtomicU64,
    catalog_cache: RwLock<Option<CornerCatalog>>,
}

impl<S: DataSource> AnalysisService<S> {
    pub fn new(source: S, config: AnalysisConfig) -> Self {
        Self {
            source,
            config,
            generation: AtomicU64::new(0),
            catalog_cache: RwLock::new(None),
        }
    }

    fn begin_request(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_current(&self, generation: u64) -> Result<(), AnalysisError> {
        if self.generation.load(Ordering::SeqCst) == generation {
            Ok(())
        } else {
            Err(AnalysisError::Stale)
        }
    }

    /// Build (or reuse) the corner catalog for the reference driver's
    /// fastest lap in this session.
    pub async fn corner_catalog(
        &self,
        session: SessionKey,
        reference_driver: DriverNumber,
    ) -> Result<CornerCatalog, AnalysisError> {
        let generation = self.begin_request();
        let catalog = self.catalog_for(session, reference_driver, generation).await?;
        self.ensure_current(generation)?;
        Ok(catalog)
    }

    /// Corner metrics for each requested driver at one catalog corner.
    ///
    /// Drivers whose fetch fails or whose aligned window is too thin are
    /// omitted from the result, not reported as errors.
    pub async fn corner_comparison(
        &self,
        session: SessionKey,
        reference_driver: DriverNumber,
        corner_ordinal: usize,
        drivers: &[DriverNumber],
    ) -> Result<Vec<DriverCornerMetrics>, AnalysisError> {
        let generation = self.begin_request();
        let catalog = self.catalog_for(session, reference_driver, generation).await?;
        let corner = catalog
            .corners
            .get(corner_ordinal)
            .ok_or(AnalysisError::CornerOutOfRange(corner_ordinal))?;

        let laps = self.source.lap_records(session, None).await?;

        // Independent reads; fetch every driver's lap window concurrently.
        let fetches = drivers.iter().map(|&driver| {
            let laps = &laps;
            async move {
                let Some((start, end)) = fastest_lap(laps, driver).and_then(lap_time_window)
                else {
                    debug!(driver = %driver, "no usable lap, skipping driver");
                    return None;
                };
                match self.source.telemetry_samples(session, driver, start, end).await {
                    Ok(samples) => Some((driver, samples)),
                    Err(err) => {
                        warn!(driver = %driver, error = %err, "telemetry fetch failed, omitting driver");
                        None
                    }
                }
            }
        });
        let windows = join_all(fetches).await;
        self.ensure_current(generation)?;

        let mut comparison = Vec::new();
        for (driver, samples) in windows.into_iter().flatten() {
            let Some(window) =
                align_segment(corner.index, catalog.sample_count, &samples, &self.config)
            else {
                debug!(driver = %driver, "aligned segment too thin, omitting driver");
                continue;
            };
            if let Some(metrics) = extract_metrics(driver, window, &self.config) {
                comparison.push(metrics);
            }
        }
        info!(
            corner = corner_ordinal,
            requested = drivers.len(),
            produced = comparison.len(),
            "corner comparison complete"
        );
        Ok(comparison)
    }

    /// Lap-by-lap running order for the whole session.
    pub async fn position_table(
        &self,
        session: SessionKey,
    ) -> Result<Vec<PositionTableEntry>, AnalysisError> {
        let generation = self.begin_request();
        let laps = self.source.lap_records(session, None).await?;
        self.ensure_current(generation)?;
        Ok(reconstruct_positions(&laps))
    }

    async fn catalog_for(
        &self,
        session: SessionKey,
        driver: DriverNumber,
        generation: u64,
    ) -> Result<CornerCatalog, AnalysisError> {
        if let Some(cached) = self.catalog_cache.read().as_ref() {
            if cached.session == session && cached.reference_driver == driver {
                debug!(session = %session, driver = %driver, "corner catalog cache hit");
                return Ok(cached.clone());
            }
        }

        let laps = self.source.lap_records(session, Some(driver)).await?;
        let (start, end) = fastest_lap(&laps, driver)
            .and_then(lap_time_window)
            .ok_or(AnalysisError::NoReferenceLap(driver))?;

        let positions = self.source.position_samples(session, driver, start, end).await?;
        let thinned = downsample(&positions, self.config.downsample_target);
        let corners = detect_corners(&thinned, &self.config);
        info!(
            session = %session,
            driver = %driver,
            samples = thinned.len(),
            corners = corners.len(),
            "corner catalog built"
        );

        let catalog = CornerCatalog {
            session,
            reference_driver: driver,
            sample_count: thinned.len(),
            corners,
        };
        // Never let a superseded request poison the cache.
        if self.ensure_current(generation).is_ok() {
            *self.catalog_cache.write() = Some(catalog.clone());
        }
        Ok(catalog)
    }
}

/// Wall-clock window covered by a lap, when the record carries enough to
/// know it.
fn lap_time_window(lap: &LapRecord) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = lap.start_time?;
    let duration = lap.timed_duration()?;
    let end = start + Duration::milliseconds((duration * 1000.0).round() as i64);
    Some((start, end))
}
