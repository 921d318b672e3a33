use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time read of an autoscaling group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacitySnapshot {
    pub desired: i32,
    pub min: i32,
    pub max: i32,
    /// Instances currently attached to the group.
    pub current: usize,
    pub healthy: usize,
}

/// A capacity-changing event reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalingActivity {
    pub id: String,
    pub description: String,
    pub status_code: String,
    pub cause: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_capacity: Option<i32>,
}

/// Extracts the target of "... changing the desired capacity from X to Y ..."
/// from an activity cause.
pub fn desired_capacity_from_cause(cause: &str) -> Option<i32> {
    const MARKER: &str = "desired capacity from ";

    let lower = cause.to_ascii_lowercase();
    let start = lower.find(MARKER)? + MARKER.len();
    let rest = &cause[start..];

    let (_, target) = rest.split_once(" to ")?;
    let digits: String = target
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
