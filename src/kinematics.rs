//! Apex, braking and throttle metrics from one corner's telemetry window.
//!
//! Distances are heuristic: index deltas scaled by an approximate
//! meters-per-sample constant, not integrated from measured speed. That is
//! accurate enough for cross-driver comparison at one corner because every
//! driver's window is scaled by the same constant.

use crate::config::AnalysisConfig;
use crate::types::{DriverCornerMetrics, DriverNumber, TelemetrySample, TracePoint};

/// Compute corner metrics for one driver's telemetry window.
///
/// The window comes from the segment aligner, which already rejects windows
/// below the minimum length; only an empty window yields `None` here.
pub fn extract_metrics(
    driver: DriverNumber,
    window: &[TelemetrySample],
    cfg: &AnalysisConfig,
) -> Option<DriverCornerMetrics> {
    if window.is_empty() {
        return None;
    }

    let apex = apex_index(window);
    let entry_speed = window[0].speed;
    let exit_speed = window[window.len() - 1].speed;

    // First brake application before the apex. No crossing means the driver
    // carried the corner without braking in this window: distance 0.
    let braking_distance_m = window[..=apex]
        .iter()
        .position(|s| s.brake > cfg.brake_threshold_pct)
        .map(|i| (apex - i) as f64 * cfg.meters_per_sample)
        .unwrap_or(0.0);

    // First meaningful throttle after the apex, same fallback.
    let throttle_on_distance_m = window[apex..]
        .iter()
        .position(|s| s.throttle > cfg.throttle_threshold_pct)
        .map(|i| i as f64 * cfg.meters_per_sample)
        .unwrap_or(0.0);

    let trace = window
        .iter()
        .enumerate()
        .map(|(i, s)| TracePoint {
            distance_m: (i as f64 - apex as f64) * cfg.meters_per_sample,
            speed: s.speed,
        })
        .collect();

    Some(DriverCornerMetrics {
        driver,
        entry_speed,
        min_speed: window[apex].speed,
        exit_speed,
        braking_distance_m,
        throttle_on_distance_m,
        trace,
    })
}

/// Index of the minimum-speed sample; ties resolve to the first occurrence.
fn apex_index(window: &[TelemetrySample]) -> usize {
    let mut best = 0;
    for (i, s) in window.iter().enumerate().skip(1) {
        if s.speed < window[best].speed {
            best = i;
        }
    }
    best
}
