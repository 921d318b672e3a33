use async_trait::async_trait;
use tracing::info;

use crate::cloud::{MetricsSink, Result};

use super::MetricSample;

/// Writes batches to the log instead of a backend (`--dry-run`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl MetricsSink for LogSink {
    async fn put_metric_data(&self, namespace: &str, batch: &[MetricSample]) -> Result<()> {
        for sample in batch {
            let dimensions = sample
                .dimensions
                .iter()
                .map(|d| format!("{}={}", d.name, d.value))
                .collect::<Vec<_>>()
                .join(",");
            info!(
                namespace,
                metric = %sample.name,
                value = sample.value,
                unit = %sample.unit,
                dimensions = %dimensions,
                "dry-run metric"
            );
        }
        Ok(())
    }
}
