//! Wall-clock timestamping for output records.
//!
//! Kept to a single narrow helper so the rest of the crate (in particular
//! the simulator, which must be byte-for-byte deterministic per spec §4.D)
//! never touches the system clock itself.

use std::time::{SystemTime, UNIX_EPOCH};

/// RFC 3339-ish timestamp (seconds since epoch) for result records. Not
/// used anywhere that determinism is required — only to stamp
/// [`crate::output::AnalysisResults`] / [`crate::output::SimulationResults`]
/// for downstream consumers.
pub fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs}")
}
