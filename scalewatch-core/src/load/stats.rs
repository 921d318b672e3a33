use std::time::Duration;

use serde::Serialize;

/// Fewer latency samples than this (inclusive) report a p95 of 0.
pub const P95_MIN_SAMPLES: usize = 20;

/// One worker's private counters, merged only after every worker finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerTally {
    pub success: u64,
    pub failed: u64,
    /// Seconds, in the order the successful requests completed.
    pub response_times: Vec<f64>,
}

impl WorkerTally {
    pub fn record_success(&mut self, elapsed: Duration) {
        self.success += 1;
        self.response_times.push(elapsed.as_secs_f64());
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Percent.
    pub success_rate: f64,
    /// Seconds.
    pub average_response_time: f64,
    /// Seconds.
    pub p95_response_time: f64,
    pub requests_per_second: f64,
}

pub fn aggregate(tallies: &[WorkerTally], elapsed: Duration) -> LoadSummary {
    let successful_requests: u64 = tallies.iter().map(|t| t.success).sum();
    let failed_requests: u64 = tallies.iter().map(|t| t.failed).sum();
    let total_requests = successful_requests + failed_requests;

    let latencies: Vec<f64> = tallies
        .iter()
        .flat_map(|t| t.response_times.iter().copied())
        .collect();

    let success_rate = if total_requests > 0 {
        successful_requests as f64 / total_requests as f64 * 100.0
    } else {
        0.0
    };

    let elapsed_secs = elapsed.as_secs_f64();
    let requests_per_second = if elapsed_secs > 0.0 {
        total_requests as f64 / elapsed_secs
    } else {
        0.0
    };

    LoadSummary {
        total_requests,
        successful_requests,
        failed_requests,
        success_rate,
        average_response_time: mean(&latencies),
        p95_response_time: p95(&latencies),
        requests_per_second,
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// 19th of 20 quantile cut points, interpolated with the exclusive method
/// (positions over `n + 1`). Historical reports were computed this way.
pub fn p95(samples: &[f64]) -> f64 {
    const BUCKETS: usize = 20;
    const CUT: usize = 19;

    if samples.len() <= P95_MIN_SAMPLES {
        return 0.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let m = sorted.len() + 1;
    let j = CUT * m / BUCKETS;
    let delta = CUT * m - j * BUCKETS;

    // len > 20 keeps 1 <= j < len.
    (sorted[j - 1] * (BUCKETS - delta) as f64 + sorted[j] * delta as f64) / BUCKETS as f64
}
