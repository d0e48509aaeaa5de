use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Tunables for the analysis core and the upstream connection.
///
/// Every field has a default; a config file only needs to name the knobs it
/// overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Heading change (radians) above which a window center counts as a corner
    pub curvature_threshold_rad: f64,
    /// Floor for the curvature step window
    pub min_step_window: usize,
    /// Step window is `sample_count / step_window_divisor`, floored at `min_step_window`
    pub step_window_divisor: usize,
    /// Half-width of corner/segment windows as a fraction of the lap
    pub corner_window_fraction: f64,
    /// Hard cap on detected corners, bounds downstream cost
    pub max_corners: usize,
    /// Segments shorter than this skip the driver for that corner
    pub min_segment_samples: usize,
    /// Brake pedal percentage that counts as braking
    pub brake_threshold_pct: f64,
    /// Throttle pedal percentage that counts as back on power
    pub throttle_threshold_pct: f64,
    /// Heuristic sample spacing in meters, from typical top speed at the
    /// feed's ~3-4 Hz rate. Not measured per lap.
    pub meters_per_sample: f64,
    /// Position sequences are thinned to about this many samples before
    /// geometric analysis
    pub downsample_target: usize,
    /// Base URL of the data-source API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_s: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            curvature_threshold_rad: 0.27,
            min_step_window: 5,
            step_window_divisor: 30,
            corner_window_fraction: 0.08,
            max_corners: 20,
            min_segment_samples: 10,
            brake_threshold_pct: 10.0,
            throttle_threshold_pct: 50.0,
            meters_per_sample: 8.5,
            downsample_target: 400,
            base_url: "https://api.openf1.org/v1".to_string(),
            request_timeout_s: 10,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON at {}", path.display()))?;
        Ok(cfg)
    }
}
