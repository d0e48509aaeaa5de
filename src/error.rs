use crate::source::FetchError;
use crate::types::DriverNumber;
use thiserror::Error;

/// Failures surfaced by the analysis service.
///
/// Insufficient data is deliberately absent: components degrade to empty or
/// partial output and callers omit the affected driver or corner instead of
/// erroring.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The upstream query failed or timed out; recoverable, prior results
    /// for other drivers are retained.
    #[error("upstream fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A newer request superseded this one while it was in flight. Callers
    /// drop the result silently.
    #[error("superseded by a newer request")]
    Stale,

    /// The reference driver has no timed lap with a known start, so there is
    /// nothing to build a corner catalog from.
    #[error("no usable reference lap for driver {0}")]
    NoReferenceLap(DriverNumber),

    /// The requested corner ordinal is outside the current catalog.
    #[error("corner {0} is not in the current catalog")]
    CornerOutOfRange(usize),
}
