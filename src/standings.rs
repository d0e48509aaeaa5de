//! Lap-by-lap running-order reconstruction from the session lap table.

use crate::types::{DriverNumber, LapRecord, PositionTableEntry};
use std::collections::BTreeMap;

/// Rebuild each driver's position after every lap by accumulating timed lap
/// durations and ranking cumulative totals.
///
/// A driver without a timed lap at some lap number keeps their prior total
/// for that lap's ranking; this carries them through gaps in the record
/// rather than modelling them as lapped or retired. A driver with no timed
/// lap at all never appears.
///
/// Ties on cumulative time are deterministic: drivers are ranked by a stable
/// sort over ascending driver number, so the lower number takes the better
/// position.
pub fn reconstruct_positions(laps: &[LapRecord]) -> Vec<PositionTableEntry> {
    let mut by_lap: BTreeMap<u32, Vec<(DriverNumber, f64)>> = BTreeMap::new();
    for lap in laps {
        if let Some(duration) = lap.timed_duration() {
            by_lap.entry(lap.lap_number).or_default().push((lap.driver, duration));
        }
    }

    let mut cumulative: BTreeMap<DriverNumber, f64> = BTreeMap::new();
    let mut table = Vec::new();

    for (lap_number, timed) in by_lap {
        for (driver, duration) in timed {
            *cumulative.entry(driver).or_insert(0.0) += duration;
        }

        // BTreeMap iteration gives ascending driver number; the stable sort
        // preserves that order for exact ties.
        let mut ranking: Vec<(DriverNumber, f64)> =
            cumulative.iter().map(|(&d, &t)| (d, t)).collect();
        ranking.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (rank, (driver, _)) in ranking.into_iter().enumerate() {
            table.push(PositionTableEntry { lap_number, driver, position: rank as u32 + 1 });
        }
    }

    table
}

/// The driver's quickest timed lap, if any.
pub fn fastest_lap(laps: &[LapRecord], driver: DriverNumber) -> Option<&LapRecord> {
    laps.iter()
        .filter(|l| l.driver == driver)
        .filter_map(|l| l.timed_duration().map(|d| (l, d)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(l, _)| l)
}
