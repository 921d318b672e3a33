//! Seams to the managed cloud services.
//!
//! The collector and the tester only ever talk to these traits; the AWS
//! implementations live in `scalewatch-aws`, tests plug in fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::metrics::MetricSample;
use crate::scaling::{CapacitySnapshot, ScalingActivity};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{service} {operation} failed: {message}")]
    Backend {
        service: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn backend(
        service: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            service,
            operation,
            message: message.into(),
        }
    }
}

/// Monitoring backend accepting batched metric data.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Publishes one batch. Callers keep batches within the backend's per-call limit.
    async fn put_metric_data(&self, namespace: &str, batch: &[MetricSample]) -> Result<()>;
}

/// Read-only view of an autoscaling group and its metrics.
#[async_trait]
pub trait ScalingControlPlane: Send + Sync {
    /// Fails with [`Error::NotFound`] when the group does not exist.
    async fn describe_capacity(&self, group: &str) -> Result<CapacitySnapshot>;

    /// Most recent activities first, at most `max_records`.
    async fn scaling_activities(
        &self,
        group: &str,
        max_records: usize,
    ) -> Result<Vec<ScalingActivity>>;

    /// Mean of the group's average CPU datapoints over the trailing `window`.
    /// `None` when the backend has no datapoints.
    async fn average_cpu(&self, group: &str, window: Duration) -> Result<Option<f64>>;
}

#[async_trait]
pub trait LoadBalancerDirectory: Send + Sync {
    /// Resolves a named load balancer to its DNS name.
    async fn dns_name(&self, name: &str) -> Result<Option<String>>;
}
