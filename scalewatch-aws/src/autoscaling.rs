use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_autoscaling::types::{Activity, AutoScalingGroup};
use scalewatch_core::cloud::{self, ScalingControlPlane};
use scalewatch_core::scaling::desired_capacity_from_cause;
use scalewatch_core::{CapacitySnapshot, ScalingActivity};

use crate::cloudwatch::group_average_cpu;
use crate::{backend_error, to_chrono};

const SERVICE: &str = "autoscaling";
const HEALTHY: &str = "Healthy";
/// `DescribeScalingActivities` page size limit.
const MAX_ACTIVITY_RECORDS: usize = 100;

/// Auto Scaling group introspection plus its CloudWatch CPU metric.
#[derive(Debug, Clone)]
pub struct AutoScalingControlPlane {
    autoscaling: aws_sdk_autoscaling::Client,
    cloudwatch: aws_sdk_cloudwatch::Client,
}

impl AutoScalingControlPlane {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            autoscaling: aws_sdk_autoscaling::Client::new(config),
            cloudwatch: aws_sdk_cloudwatch::Client::new(config),
        }
    }
}

fn capacity_from_group(group: &AutoScalingGroup) -> CapacitySnapshot {
    let instances = group.instances();
    CapacitySnapshot {
        desired: Option::from(group.desired_capacity()).unwrap_or(0),
        min: Option::from(group.min_size()).unwrap_or(0),
        max: Option::from(group.max_size()).unwrap_or(0),
        current: instances.len(),
        healthy: instances
            .iter()
            .filter(|i| Option::<&str>::from(i.health_status()) == Some(HEALTHY))
            .count(),
    }
}

fn activity_from_sdk(activity: &Activity) -> ScalingActivity {
    let cause = Option::<&str>::from(activity.cause()).unwrap_or_default();
    ScalingActivity {
        id: Option::<&str>::from(activity.activity_id())
            .unwrap_or_default()
            .to_string(),
        description: Option::<&str>::from(activity.description())
            .unwrap_or_default()
            .to_string(),
        status_code: Option::from(activity.status_code())
            .map(|code: &aws_sdk_autoscaling::types::ScalingActivityStatusCode| {
                code.as_str().to_string()
            })
            .unwrap_or_default(),
        cause: cause.to_string(),
        start_time: Option::from(activity.start_time()).and_then(to_chrono),
        desired_capacity: desired_capacity_from_cause(cause),
    }
}

#[async_trait]
impl ScalingControlPlane for AutoScalingControlPlane {
    async fn describe_capacity(&self, group: &str) -> cloud::Result<CapacitySnapshot> {
        let res = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group)
            .send()
            .await
            .map_err(|err| backend_error(SERVICE, "DescribeAutoScalingGroups", err))?;

        res.auto_scaling_groups()
            .first()
            .map(capacity_from_group)
            .ok_or_else(|| cloud::Error::NotFound {
                kind: "auto scaling group",
                name: group.to_string(),
            })
    }

    async fn scaling_activities(
        &self,
        group: &str,
        max_records: usize,
    ) -> cloud::Result<Vec<ScalingActivity>> {
        let max_records = max_records.clamp(1, MAX_ACTIVITY_RECORDS) as i32;
        let res = self
            .autoscaling
            .describe_scaling_activities()
            .auto_scaling_group_name(group)
            .max_records(max_records)
            .send()
            .await
            .map_err(|err| backend_error(SERVICE, "DescribeScalingActivities", err))?;

        Ok(res.activities().iter().map(activity_from_sdk).collect())
    }

    async fn average_cpu(&self, group: &str, window: Duration) -> cloud::Result<Option<f64>> {
        group_average_cpu(&self.cloudwatch, group, window).await
    }
}
