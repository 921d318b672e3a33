//! Providers for application values that have no real instrumentation yet.

use std::time::{SystemTime, UNIX_EPOCH};

pub trait SampleSource: Send + Sync {
    fn sample(&self) -> f64;
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Placeholder session count: 20 plus a value in `0..30` that drifts with the clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockSessions;

impl ClockSessions {
    pub fn at(unix_secs: u64) -> f64 {
        let time_factor = unix_secs % 100;
        (20 + time_factor % 30) as f64
    }
}

impl SampleSource for ClockSessions {
    fn sample(&self) -> f64 {
        Self::at(unix_secs())
    }
}

/// Placeholder error rate: 0.5% with a 2.5% spike during the first 30s of
/// every 5-minute cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockErrorRate;

impl ClockErrorRate {
    const BASE: f64 = 0.5;
    const SPIKE: f64 = 2.0;

    pub fn at(unix_secs: u64) -> f64 {
        if unix_secs % 300 < 30 {
            Self::BASE + Self::SPIKE
        } else {
            Self::BASE
        }
    }
}

impl SampleSource for ClockErrorRate {
    fn sample(&self) -> f64 {
        Self::at(unix_secs())
    }
}

impl<F> SampleSource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn sample(&self) -> f64 {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_stay_within_placeholder_range() {
        for secs in 0..300 {
            let v = ClockSessions::at(secs);
            assert!((20.0..50.0).contains(&v), "secs={secs} v={v}");
        }
        assert_eq!(ClockSessions::at(1_000), 20.0);
        assert_eq!(ClockSessions::at(1_045), 35.0);
        assert_eq!(ClockSessions::at(1_029), 49.0);
    }

    #[test]
    fn error_rate_spikes_at_cycle_start() {
        assert_eq!(ClockErrorRate::at(600), 2.5);
        assert_eq!(ClockErrorRate::at(629), 2.5);
        assert_eq!(ClockErrorRate::at(630), 0.5);
        assert_eq!(ClockErrorRate::at(899), 0.5);
    }

    #[test]
    fn closures_are_sources() {
        let fixed = || 7.0;
        let source: &dyn SampleSource = &fixed;
        assert_eq!(source.sample(), 7.0);
    }
}
