//! Curvature-based corner detection over one reference lap.
//!
//! The detector slides a step window across the position sequence and
//! compares the heading of the chord arriving at each window center with the
//! heading of the chord leaving it. A heading change above the configured
//! threshold marks a corner candidate; candidates produced by consecutive
//! window steps over the same physical corner are merged afterwards.
//!
//! Corner indices are positions within the reference sample sequence. They
//! order corners by lap progress from the first sample (assumed to sit at
//! the start/finish line) and do not match official circuit numbering.

use crate::config::AnalysisConfig;
use crate::types::{Corner, PositionSample, TrackPoint};
use tracing::debug;

/// Detect corners in an ordered, sentinel-free position sequence.
///
/// Sequences shorter than four step windows produce an empty catalog rather
/// than an error; a lap that short carries no usable geometry.
pub fn detect_corners(samples: &[PositionSample], cfg: &AnalysisConfig) -> Vec<Corner> {
    let n = samples.len();
    let w = step_window(n, cfg);
    if n < 4 * w {
        debug!(samples = n, window = w, "sequence too short for corner detection");
        return Vec::new();
    }

    let candidates = scan_candidates(samples, w, cfg.curvature_threshold_rad);
    let accepted = merge_adjacent(&candidates, w);

    let half_window = (n as f64 * cfg.corner_window_fraction).floor() as usize;
    let corners: Vec<Corner> = accepted
        .into_iter()
        .take(cfg.max_corners)
        .map(|i| {
            let lo = i.saturating_sub(half_window);
            let hi = (i + half_window).min(n - 1);
            Corner {
                index: i,
                center: TrackPoint { x: samples[i].x, y: samples[i].y },
                reference_window: samples[lo..=hi].to_vec(),
            }
        })
        .collect();

    debug!(
        samples = n,
        window = w,
        raw = candidates.len(),
        corners = corners.len(),
        "corner detection complete"
    );
    corners
}

/// Step window: 1/30 of the lap, floored so the scan stride never
/// degenerates on short sequences.
fn step_window(sample_count: usize, cfg: &AnalysisConfig) -> usize {
    (sample_count / cfg.step_window_divisor).max(cfg.min_step_window)
}

/// Heading of the chord from `a` to `b`.
fn chord_heading(a: &PositionSample, b: &PositionSample) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Absolute heading change between the chords `(i-w -> i)` and `(i -> i+w)`,
/// normalized into `[0, pi]`.
fn heading_change(samples: &[PositionSample], i: usize, w: usize) -> f64 {
    let inbound = chord_heading(&samples[i - w], &samples[i]);
    let outbound = chord_heading(&samples[i], &samples[i + w]);
    let mut diff = (outbound - inbound).abs();
    if diff > std::f64::consts::PI {
        diff = 2.0 * std::f64::consts::PI - diff;
    }
    diff
}

/// Slide the window with stride `w/2` and collect every center whose heading
/// change exceeds the threshold, in ascending index order.
fn scan_candidates(samples: &[PositionSample], w: usize, threshold_rad: f64) -> Vec<usize> {
    let n = samples.len();
    let stride = (w / 2).max(1);
    let mut candidates = Vec::new();
    let mut i = w;
    while i + w < n {
        if heading_change(samples, i, w) > threshold_rad {
            candidates.push(i);
        }
        i += stride;
    }
    candidates
}

/// Merge candidates fired by consecutive window steps over one physical
/// corner: walking in ascending index order, a candidate is accepted only if
/// no already-accepted corner lies within `1.5 * w` samples of it.
fn merge_adjacent(candidates: &[usize], w: usize) -> Vec<usize> {
    let radius = 1.5 * w as f64;
    let mut accepted: Vec<usize> = Vec::new();
    for &i in candidates {
        let near_existing = accepted
            .iter()
            .any(|&a| (i as f64 - a as f64).abs() <= radius);
        if !near_existing {
            accepted.push(i);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 26, 14, 0, 0).unwrap()
    }

    fn sample(i: usize, x: f64, y: f64) -> PositionSample {
        PositionSample {
            t: base_time() + Duration::milliseconds(300 * i as i64),
            x,
            y,
            z: 0.0,
        }
    }

    /// Open path with right-angle bends at the given indices, one unit of
    /// distance per sample, alternating east and north legs. Offset away
    /// from the origin so no point looks like a no-fix sentinel.
    fn bent_path(n: usize, bends: &[usize]) -> Vec<PositionSample> {
        let mut pts = Vec::with_capacity(n);
        let (mut x, mut y) = (10.0, 10.0);
        let mut east = true;
        for i in 0..n {
            pts.push(sample(i, x, y));
            if bends.contains(&(i + 1)) {
                east = !east;
            }
            if east {
                x += 1.0;
            } else {
                y += 1.0;
            }
        }
        pts
    }

    fn test_config(threshold: f64) -> AnalysisConfig {
        AnalysisConfig { curvature_threshold_rad: threshold, ..AnalysisConfig::default() }
    }

    #[test]
    fn test_circle_yields_no_corners() {
        // 360 evenly spaced samples on a circle: the chord-to-chord heading
        // change at every center is w degrees (12 at this length), below the
        // 0.25 rad threshold everywhere.
        let n = 360;
        let samples: Vec<PositionSample> = (0..n)
            .map(|i| {
                let a = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                sample(i, 500.0 + 300.0 * a.cos(), 500.0 + 300.0 * a.sin())
            })
            .collect();

        let corners = detect_corners(&samples, &test_config(0.25));
        assert!(
            corners.is_empty(),
            "constant gentle curvature must not register as corners, got {}",
            corners.len()
        );
        println!("✓ Circle produced an empty catalog");
    }

    #[test]
    fn test_square_path_yields_four_corners() {
        // 400 straight-line points with 90-degree bends at four known
        // indices; each bend must be found within one step window.
        let bends = [80usize, 160, 240, 320];
        let samples = bent_path(400, &bends);
        let w = step_window(samples.len(), &test_config(0.25));

        let corners = detect_corners(&samples, &test_config(0.25));
        assert_eq!(corners.len(), 4, "expected one corner per bend, got {}", corners.len());

        for (corner, bend) in corners.iter().zip(bends.iter()) {
            let err = (corner.index as i64 - *bend as i64).unsigned_abs() as usize;
            assert!(
                err <= w,
                "corner at {} too far from bend at {} (tolerance {})",
                corner.index,
                bend,
                w
            );
        }
        println!("✓ Found 4 corners within ±{} samples of the bends", w);
    }

    #[test]
    fn test_corners_are_in_lap_progress_order() {
        let samples = bent_path(400, &[80, 160, 240, 320]);
        let corners = detect_corners(&samples, &test_config(0.25));
        for pair in corners.windows(2) {
            assert!(pair[0].index < pair[1].index, "catalog must ascend by index");
        }
    }

    #[test]
    fn test_merge_collapses_candidates_one_window_apart() {
        let w = 13;
        assert_eq!(
            merge_adjacent(&[200, 200 + w], w),
            vec![200],
            "candidates separated by w are one physical corner"
        );
        assert_eq!(
            merge_adjacent(&[200, 200 + 2 * w], w),
            vec![200, 226],
            "candidates separated by 2w are distinct corners"
        );
        println!("✓ De-duplication radius behaves at both separations");
    }

    #[test]
    fn test_merge_checks_all_accepted_corners() {
        // The middle candidate is suppressed by the first; the last is far
        // enough from the *accepted* corner even though it is close to the
        // suppressed one.
        let w = 10;
        assert_eq!(merge_adjacent(&[100, 110, 120], w), vec![100, 120]);
    }

    #[test]
    fn test_two_bends_two_windows_apart_stay_distinct() {
        let samples = bent_path(400, &[200, 226]);
        let corners = detect_corners(&samples, &test_config(0.25));
        assert_eq!(corners.len(), 2, "bends 2w apart must remain two corners");
    }

    #[test]
    fn test_short_sequence_fails_softly() {
        let samples = bent_path(15, &[8]);
        let corners = detect_corners(&samples, &test_config(0.25));
        assert!(corners.is_empty(), "short sequences produce an empty catalog, not an error");
    }

    #[test]
    fn test_catalog_capped_at_max_corners() {
        let bends: Vec<usize> = (1..8).map(|k| k * 50).collect();
        let samples = bent_path(400, &bends);
        let cfg = AnalysisConfig { max_corners: 3, ..test_config(0.25) };
        let corners = detect_corners(&samples, &cfg);
        assert_eq!(corners.len(), 3, "catalog must be capped to bound downstream cost");
    }

    #[test]
    fn test_reference_window_is_clamped_and_centered() {
        let samples = bent_path(400, &[80, 160, 240, 320]);
        let cfg = test_config(0.25);
        let corners = detect_corners(&samples, &cfg);
        let half = (samples.len() as f64 * cfg.corner_window_fraction).floor() as usize;
        for corner in &corners {
            assert!(corner.reference_window.len() <= 2 * half + 1);
            assert!(!corner.reference_window.is_empty());
            let center = &samples[corner.index];
            assert!(
                corner.reference_window.iter().any(|s| s == center),
                "window must contain the corner center sample"
            );
        }
    }
}
