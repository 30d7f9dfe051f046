use std::time::Duration;

use crate::run::PerformanceSummary;

/// Stage 5 arithmetic. Fixed formulas:
/// `efficiency = clamp(0, 100, 100 - elapsed_secs + precision_rate * 100)`
/// and `throughput = scanned / elapsed_secs`, with zero-guards for empty
/// scans and zero elapsed time.
pub fn analyze(elapsed: Duration, total_scanned: usize, verified_count: usize) -> PerformanceSummary {
    let secs = elapsed.as_secs_f64();

    let precision_rate = if total_scanned > 0 {
        verified_count as f64 / total_scanned as f64
    } else {
        0.0
    };

    let pipeline_efficiency = (100.0 - secs + precision_rate * 100.0).clamp(0.0, 100.0);

    let throughput_per_sec = if secs > 0.0 {
        total_scanned as f64 / secs
    } else {
        0.0
    };

    PerformanceSummary {
        total_processing_ms: elapsed.as_millis() as u64,
        precision_rate,
        pipeline_efficiency,
        throughput_per_sec,
    }
}
