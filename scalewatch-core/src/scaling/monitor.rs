use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

use super::activity::CapacitySnapshot;
use super::probe::GroupProbe;

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorResult {
    pub scaling_detected: bool,
    pub initial_capacity: Option<CapacitySnapshot>,
    /// Latest snapshot whose desired capacity differed from the baseline;
    /// the baseline itself when nothing changed.
    pub final_capacity: Option<CapacitySnapshot>,
    pub capacity_change: i32,
    /// Activities that appeared after the baseline read.
    pub new_activities: usize,
    /// Highest desired capacity seen, baseline included.
    pub peak_desired_capacity: Option<i32>,
    /// Seconds.
    pub monitoring_duration: u64,
}

fn desired_or_zero(capacity: Option<CapacitySnapshot>) -> i32 {
    capacity.map_or(0, |c| c.desired)
}

/// Polls the group until `timeout` elapses and reports how its desired
/// capacity moved relative to the first read.
///
/// Failed capacity reads are skipped; they never count as a change.
pub async fn monitor_scaling_event(
    probe: &GroupProbe,
    timeout: Duration,
    poll_interval: Duration,
    activity_window: usize,
) -> MonitorResult {
    info!(
        "monitoring scaling events for {}s on {}",
        timeout.as_secs(),
        probe.group()
    );
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

    let initial_capacity = probe.current_capacity().await;
    let baseline = desired_or_zero(initial_capacity);
    let mut seen: HashSet<String> = probe
        .scaling_activities(activity_window)
        .await
        .into_iter()
        .map(|a| a.id)
        .collect();

    let started = Instant::now();
    let mut scaling_detected = false;
    let mut final_capacity = initial_capacity;
    let mut peak_desired_capacity = initial_capacity.map(|c| c.desired);
    let mut new_activities = 0;

    while started.elapsed() < timeout {
        if let Some(current) = probe.current_capacity().await {
            peak_desired_capacity = Some(
                peak_desired_capacity.map_or(current.desired, |peak| peak.max(current.desired)),
            );

            if current.desired != baseline {
                if !scaling_detected {
                    scaling_detected = true;
                    info!(
                        "scaling detected: desired capacity changed from {} to {}",
                        baseline, current.desired
                    );
                }
                final_capacity = Some(current);
            }
        }

        for activity in probe.scaling_activities(activity_window).await {
            if seen.insert(activity.id.clone()) {
                new_activities += 1;
                info!(
                    "scaling activity: {} - {}",
                    activity.description, activity.status_code
                );
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    MonitorResult {
        scaling_detected,
        initial_capacity,
        final_capacity,
        capacity_change: desired_or_zero(final_capacity) - baseline,
        new_activities,
        peak_desired_capacity,
        monitoring_duration: timeout.as_secs(),
    }
}
