//! Cross-driver segment alignment by positional ratio.
//!
//! Different cars sample independently, so a corner found on the reference
//! lap has no shared index into another driver's sequence. The aligner maps
//! the corner's fractional position along the reference lap onto the target
//! sequence and cuts a bounded window there.
//!
//! This is an approximation, not an arc-length model: it assumes same-session
//! laps are sampled at comparable rates over comparable distance. It degrades
//! for laps that include the pit lane or a safety-car phase.

use crate::config::AnalysisConfig;

/// Extract the target driver's samples around a reference corner.
///
/// `corner_index` is the corner's position within the reference sequence of
/// length `n_ref`. Works on position and telemetry sequences alike.
///
/// Returns `None` when fewer than `min_segment_samples` land in the window;
/// callers treat that as "skip this driver for this corner", never as an
/// error.
pub fn align_segment<'a, T>(
    corner_index: usize,
    n_ref: usize,
    target: &'a [T],
    cfg: &AnalysisConfig,
) -> Option<&'a [T]> {
    let n_target = target.len();
    if n_ref == 0 || n_target == 0 {
        return None;
    }

    let ratio = corner_index as f64 / n_ref as f64;
    let center = ((ratio * n_target as f64).floor() as usize).min(n_target - 1);
    let half = (n_target as f64 * cfg.corner_window_fraction).floor() as usize;

    let lo = center.saturating_sub(half);
    let hi = (center + half).min(n_target - 1);

    let segment = &target[lo..=hi];
    if segment.len() < cfg.min_segment_samples {
        return None;
    }
    Some(segment)
}
