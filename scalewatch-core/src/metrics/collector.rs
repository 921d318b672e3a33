use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cloud::MetricsSink;
use crate::http::HttpClient;

use super::host::{HostProbe, SysinfoHost};
use super::sample::{MetricSample, MetricUnit};
use super::sources::{ClockErrorRate, ClockSessions, SampleSource};

/// Per-call record limit of the monitoring backend.
pub const MAX_BATCH_SIZE: usize = 20;

pub const DEFAULT_HEALTH_URL: &str = "http://localhost:80";
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/instance-id";
pub const UNKNOWN_INSTANCE: &str = "unknown-instance";

const INSTANCE_DIMENSION: &str = "InstanceId";
const NON_200_RESPONSE_TIME: f64 = 1.0;
const FAILED_RESPONSE_TIME: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub namespace: String,
    pub health_url: String,
    pub health_timeout: Duration,
    /// Capped at [`MAX_BATCH_SIZE`].
    pub batch_size: usize,
    pub interval: Duration,
    /// Wait after a cycle fails unexpectedly in continuous mode.
    pub retry_backoff: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            namespace: "XYZ/Application".to_string(),
            health_url: DEFAULT_HEALTH_URL.to_string(),
            health_timeout: Duration::from_secs(5),
            batch_size: MAX_BATCH_SIZE,
            interval: Duration::from_secs(300),
            retry_backoff: Duration::from_secs(60),
        }
    }
}

/// Asks the instance metadata service who we are; any failure yields [`UNKNOWN_INSTANCE`].
pub async fn resolve_instance_id(client: &HttpClient, metadata_url: &str) -> String {
    match client
        .get(metadata_url, Duration::from_secs(2))
        .await
    {
        Ok(res) if res.is_ok() => match res.body_utf8().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => UNKNOWN_INSTANCE.to_string(),
        },
        Ok(res) => {
            debug!(status = res.status, "instance metadata lookup rejected");
            UNKNOWN_INSTANCE.to_string()
        }
        Err(err) => {
            debug!(%err, "instance metadata unavailable");
            UNKNOWN_INSTANCE.to_string()
        }
    }
}

struct HealthProbe {
    healthy: bool,
    response_time: f64,
}

pub struct MetricsCollector {
    config: CollectorConfig,
    instance_id: String,
    client: HttpClient,
    sink: Arc<dyn MetricsSink>,
    host: Arc<dyn HostProbe>,
    sessions: Box<dyn SampleSource>,
    error_rate: Box<dyn SampleSource>,
}

impl MetricsCollector {
    pub fn new(
        config: CollectorConfig,
        instance_id: impl Into<String>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            instance_id: instance_id.into(),
            client: HttpClient::default(),
            sink,
            host: Arc::new(SysinfoHost::new()),
            sessions: Box::new(ClockSessions),
            error_rate: Box::new(ClockErrorRate),
        }
    }

    #[must_use]
    pub fn with_host_probe(mut self, host: Box<dyn HostProbe>) -> Self {
        self.host = Arc::from(host);
        self
    }

    #[must_use]
    pub fn with_session_source(mut self, source: Box<dyn SampleSource>) -> Self {
        self.sessions = source;
        self
    }

    #[must_use]
    pub fn with_error_rate_source(mut self, source: Box<dyn SampleSource>) -> Self {
        self.error_rate = source;
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn sample(&self, name: &str, value: f64, unit: MetricUnit) -> MetricSample {
        MetricSample::new(name, value, unit).with_dimension(INSTANCE_DIMENSION, &self.instance_id)
    }

    /// Memory, root disk, connection count and 1-minute load average.
    /// Empty when the host cannot be read.
    pub async fn collect_system_metrics(&self) -> Vec<MetricSample> {
        let host = self.host.clone();
        let readings = match tokio::task::spawn_blocking(move || host.read()).await {
            Ok(Ok(v)) => v,
            Ok(Err(err)) => {
                error!(%err, "error collecting system metrics");
                return Vec::new();
            }
            Err(err) => {
                error!(%err, "host reading task failed");
                return Vec::new();
            }
        };

        let metrics = vec![
            self.sample(
                "MemoryUtilization",
                readings.memory_percent,
                MetricUnit::Percent,
            ),
            self.sample("DiskUtilization", readings.disk_percent, MetricUnit::Percent),
            self.sample(
                "NetworkConnections",
                readings.network_connections as f64,
                MetricUnit::Count,
            ),
            self.sample(
                "LoadAverage1Min",
                readings.load_average_1m,
                MetricUnit::None,
            ),
        ];

        info!("collected {} system metrics", metrics.len());
        metrics
    }

    async fn probe_health(&self) -> HealthProbe {
        let started = Instant::now();
        match self
            .client
            .get(&self.config.health_url, self.config.health_timeout)
            .await
        {
            Ok(res) if res.is_ok() => HealthProbe {
                healthy: true,
                response_time: started.elapsed().as_secs_f64(),
            },
            Ok(res) => {
                warn!(status = res.status, url = %self.config.health_url, "health check returned non-200");
                HealthProbe {
                    healthy: false,
                    response_time: NON_200_RESPONSE_TIME,
                }
            }
            Err(err) => {
                warn!(%err, url = %self.config.health_url, "health check failed");
                HealthProbe {
                    healthy: false,
                    response_time: FAILED_RESPONSE_TIME,
                }
            }
        }
    }

    /// Health, sessions, response time and error rate. Probe failures turn
    /// into an unhealthy reading with a penalty latency.
    pub async fn collect_application_metrics(&self) -> Vec<MetricSample> {
        let probe = self.probe_health().await;

        let metrics = vec![
            self.sample(
                "ApplicationHealth",
                if probe.healthy { 1.0 } else { 0.0 },
                MetricUnit::None,
            ),
            self.sample("ActiveSessions", self.sessions.sample(), MetricUnit::Count),
            self.sample(
                "ApplicationResponseTime",
                probe.response_time,
                MetricUnit::Seconds,
            ),
            self.sample(
                "ApplicationErrorRate",
                self.error_rate.sample(),
                MetricUnit::Percent,
            ),
        ];

        info!("collected {} application metrics", metrics.len());
        metrics
    }

    /// Stamps every sample with one timestamp and publishes them in batches.
    /// The first failing batch aborts the rest.
    pub async fn publish_metrics(&self, samples: Vec<MetricSample>) -> bool {
        if samples.is_empty() {
            warn!("no metrics to publish");
            return false;
        }

        let now = Utc::now();
        let stamped: Vec<MetricSample> = samples
            .into_iter()
            .map(|s| s.with_timestamp(now))
            .collect();

        let batch_size = self.config.batch_size.clamp(1, MAX_BATCH_SIZE);
        for batch in stamped.chunks(batch_size) {
            if let Err(err) = self
                .sink
                .put_metric_data(&self.config.namespace, batch)
                .await
            {
                error!(%err, "error publishing metrics");
                return false;
            }
            info!("published batch of {} metrics", batch.len());
        }

        info!("successfully published {} total metrics", stamped.len());
        true
    }

    pub async fn collect_and_publish_all(&self) -> bool {
        info!("starting metrics collection");

        let mut all = self.collect_system_metrics().await;
        all.extend(self.collect_application_metrics().await);

        let success = self.publish_metrics(all).await;
        info!(success, "metrics collection completed");
        success
    }
}

/// Runs collection cycles every `config.interval` until `shutdown` resolves.
/// Returns the number of cycles that ran to completion.
pub async fn run_continuous<S>(collector: Arc<MetricsCollector>, shutdown: S) -> u64
where
    S: Future<Output = ()>,
{
    let interval = collector.config.interval;
    let backoff = collector.config.retry_backoff;
    info!(
        "starting continuous metrics collection (interval: {}s)",
        interval.as_secs()
    );

    tokio::pin!(shutdown);
    let mut cycles = 0u64;

    loop {
        let worker = collector.clone();
        // A separate task so a panicking cycle cannot take the loop down with it.
        let mut cycle = tokio::spawn(async move { worker.collect_and_publish_all().await });

        let outcome = tokio::select! {
            () = &mut shutdown => {
                cycle.abort();
                break;
            }
            res = &mut cycle => res,
        };

        let wait = match outcome {
            Ok(_) => {
                cycles += 1;
                info!("sleeping for {} seconds", interval.as_secs());
                interval
            }
            Err(err) => {
                error!(%err, "unexpected error during metrics collection");
                backoff
            }
        };

        tokio::select! {
            () = &mut shutdown => break,
            () = tokio::time::sleep(wait) => {}
        }
    }

    info!("received interrupt signal, stopping");
    cycles
}
