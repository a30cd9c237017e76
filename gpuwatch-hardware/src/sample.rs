use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// A point-in-time device reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub temperature_c: u32,   // Celsius
    pub power_w: f64,         // Watts
    pub sm_clock_mhz: u32,    // MHz
    pub memory_clock_mhz: u32, // MHz
}

/// One successful poll, stamped with a monotonic timestamp
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub at: Instant,
    pub reading: TelemetryReading,
}

/// Samples collected over one monitored run.
///
/// The session has exactly one writer: the sampling loop owns it while
/// running and hands it back by move when the loop exits. Samples are
/// append-only and chronologically ordered.
#[derive(Debug)]
pub struct SamplingSession {
    device_index: u32,
    interval: Duration,
    started: Instant,
    samples: Vec<Sample>,
    failed_polls: usize,
}

impl SamplingSession {
    pub fn new(device_index: u32, interval: Duration) -> Self {
        Self {
            device_index,
            interval,
            started: Instant::now(),
            samples: Vec::new(),
            failed_polls: 0,
        }
    }

    /// Append a successful reading, stamped now.
    pub fn record(&mut self, reading: TelemetryReading) {
        let at = Instant::now();
        debug_assert!(
            self.samples.last().map_or(true, |s| at > s.at),
            "sample timestamps must be strictly increasing"
        );
        self.samples.push(Sample { at, reading });
    }

    /// Count a poll that returned a transient error.
    pub fn record_failure(&mut self) {
        self.failed_polls += 1;
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn failed_polls(&self) -> usize {
        self.failed_polls
    }

    /// Total polls attempted, successful or not.
    pub fn polls(&self) -> usize {
        self.samples.len() + self.failed_polls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(mem: u64) -> TelemetryReading {
        TelemetryReading {
            memory_used_bytes: mem,
            memory_total_bytes: 8 * 1024 * 1024 * 1024,
            temperature_c: 55,
            power_w: 180.0,
            sm_clock_mhz: 1700,
            memory_clock_mhz: 9500,
        }
    }

    #[test]
    fn test_records_preserve_insertion_order() {
        let mut session = SamplingSession::new(0, Duration::from_millis(100));
        for mem in [100u64, 200, 300] {
            session.record(reading(mem));
        }

        let recorded: Vec<u64> = session
            .samples()
            .iter()
            .map(|s| s.reading.memory_used_bytes)
            .collect();
        assert_eq!(recorded, vec![100, 200, 300]);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut session = SamplingSession::new(0, Duration::from_millis(100));
        for _ in 0..5 {
            session.record(reading(1));
        }

        for pair in session.samples().windows(2) {
            assert!(pair[1].at > pair[0].at);
        }
    }

    #[test]
    fn test_poll_accounting() {
        let mut session = SamplingSession::new(0, Duration::from_millis(100));
        session.record(reading(1));
        session.record_failure();
        session.record(reading(2));
        session.record_failure();
        session.record_failure();

        assert_eq!(session.samples().len(), 2);
        assert_eq!(session.failed_polls(), 3);
        assert_eq!(session.polls(), 5);
    }
}
