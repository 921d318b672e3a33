use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::cloud::ScalingControlPlane;

use super::activity::{CapacitySnapshot, ScalingActivity};

/// Error-absorbing reads of one autoscaling group. Failures are logged and
/// turned into empty reads so a single bad poll never ends a test.
#[derive(Clone)]
pub struct GroupProbe {
    group: String,
    control: Arc<dyn ScalingControlPlane>,
}

impl GroupProbe {
    pub fn new(group: impl Into<String>, control: Arc<dyn ScalingControlPlane>) -> Self {
        Self {
            group: group.into(),
            control,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub async fn current_capacity(&self) -> Option<CapacitySnapshot> {
        match self.control.describe_capacity(&self.group).await {
            Ok(capacity) => Some(capacity),
            Err(err) => {
                error!(%err, group = %self.group, "error getting group capacity");
                None
            }
        }
    }

    pub async fn scaling_activities(&self, max_records: usize) -> Vec<ScalingActivity> {
        match self
            .control
            .scaling_activities(&self.group, max_records)
            .await
        {
            Ok(activities) => activities,
            Err(err) => {
                error!(%err, group = %self.group, "error getting scaling activities");
                Vec::new()
            }
        }
    }

    /// Average CPU over the trailing window; 0 when unknown.
    pub async fn cpu_utilization(&self, window: Duration) -> f64 {
        match self.control.average_cpu(&self.group, window).await {
            Ok(cpu) => cpu.unwrap_or(0.0),
            Err(err) => {
                error!(%err, group = %self.group, "error getting CPU utilization");
                0.0
            }
        }
    }
}
