use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit, Statistic};
use chrono::Utc;
use scalewatch_core::cloud::{self, MetricsSink};
use scalewatch_core::{MetricSample, MetricUnit};

use crate::{backend_error, built};

const SERVICE: &str = "cloudwatch";

/// Namespace of the per-group CPU average.
pub const GROUP_CPU_NAMESPACE: &str = "AWS/EC2";
const CPU_METRIC: &str = "CPUUtilization";
const GROUP_DIMENSION: &str = "AutoScalingGroupName";
const CPU_PERIOD_SECS: i32 = 300;

fn standard_unit(unit: MetricUnit) -> StandardUnit {
    match unit {
        MetricUnit::Percent => StandardUnit::Percent,
        MetricUnit::Count => StandardUnit::Count,
        MetricUnit::Seconds => StandardUnit::Seconds,
        MetricUnit::None => StandardUnit::None,
    }
}

fn to_datum(sample: &MetricSample) -> cloud::Result<MetricDatum> {
    let mut datum = MetricDatum::builder()
        .metric_name(&sample.name)
        .value(sample.value)
        .unit(standard_unit(sample.unit));

    if let Some(ts) = sample.timestamp {
        datum = datum.timestamp(DateTime::from_millis(ts.timestamp_millis()));
    }

    for d in &sample.dimensions {
        let dimension: Dimension = built(Dimension::builder().name(&d.name).value(&d.value).build())?;
        datum = datum.dimensions(dimension);
    }

    built(datum.build())
}

/// Publishes custom metrics with `PutMetricData`.
#[derive(Debug, Clone)]
pub struct CloudWatchSink {
    client: Client,
}

impl CloudWatchSink {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl MetricsSink for CloudWatchSink {
    async fn put_metric_data(&self, namespace: &str, batch: &[MetricSample]) -> cloud::Result<()> {
        let data = batch
            .iter()
            .map(to_datum)
            .collect::<cloud::Result<Vec<_>>>()?;

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(data))
            .send()
            .await
            .map_err(|err| backend_error(SERVICE, "PutMetricData", err))?;
        Ok(())
    }
}

/// Mean of the group's 5-minute CPU averages over the trailing `window`.
pub(crate) async fn group_average_cpu(
    client: &Client,
    group: &str,
    window: Duration,
) -> cloud::Result<Option<f64>> {
    let end = Utc::now();
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    let start_ms = end.timestamp_millis().saturating_sub(window_ms);

    let dimension: Dimension =
        built(Dimension::builder().name(GROUP_DIMENSION).value(group).build())?;

    let res = client
        .get_metric_statistics()
        .namespace(GROUP_CPU_NAMESPACE)
        .metric_name(CPU_METRIC)
        .dimensions(dimension)
        .start_time(DateTime::from_millis(start_ms))
        .end_time(DateTime::from_millis(end.timestamp_millis()))
        .period(CPU_PERIOD_SECS)
        .statistics(Statistic::Average)
        .send()
        .await
        .map_err(|err| backend_error(SERVICE, "GetMetricStatistics", err))?;

    let averages: Vec<f64> = res
        .datapoints()
        .iter()
        .filter_map(|dp| dp.average())
        .collect();

    if averages.is_empty() {
        return Ok(None);
    }
    Ok(Some(averages.iter().sum::<f64>() / averages.len() as f64))
}
