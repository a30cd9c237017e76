use serde::{Deserialize, Serialize};

use crate::sample::{Sample, SamplingSession};

/// Min/max/mean for one metric over the successful samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Per-metric statistics for a session with at least one successful sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub memory_used_bytes: MetricStats,
    pub memory_total_bytes: u64,
    pub temperature_c: MetricStats,
    pub power_w: MetricStats,
    pub sm_clock_mhz: MetricStats,
    pub memory_clock_mhz: MetricStats,
}

/// Aggregate over a finished session.
///
/// `stats` is `None` exactly when no poll succeeded; the reporter renders
/// that as "no data" rather than zeros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub samples_ok: usize,
    pub samples_failed: usize,
    pub stats: Option<SessionStats>,
}

/// Compute min/max/mean per metric over the frozen session.
///
/// Pure function: calling it twice on the same session yields identical
/// results.
pub fn summarize(session: &SamplingSession) -> TelemetrySummary {
    let samples = session.samples();

    let stats = if samples.is_empty() {
        None
    } else {
        Some(SessionStats {
            memory_used_bytes: metric_stats(samples, |s| s.reading.memory_used_bytes as f64),
            memory_total_bytes: samples[0].reading.memory_total_bytes,
            temperature_c: metric_stats(samples, |s| f64::from(s.reading.temperature_c)),
            power_w: metric_stats(samples, |s| s.reading.power_w),
            sm_clock_mhz: metric_stats(samples, |s| f64::from(s.reading.sm_clock_mhz)),
            memory_clock_mhz: metric_stats(samples, |s| f64::from(s.reading.memory_clock_mhz)),
        })
    };

    TelemetrySummary {
        samples_ok: samples.len(),
        samples_failed: session.failed_polls(),
        stats,
    }
}

fn metric_stats(samples: &[Sample], metric: impl Fn(&Sample) -> f64) -> MetricStats {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;

    for sample in samples {
        let value = metric(sample);
        min = min.min(value);
        max = max.max(value);
        sum += value;
    }

    MetricStats {
        min,
        max,
        mean: sum / samples.len() as f64,
    }
}
