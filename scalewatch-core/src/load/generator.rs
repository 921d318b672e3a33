use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};

use crate::http::HttpClient;

use super::gate::{DeadlineGate, StopFlag};
use super::stats::{LoadSummary, WorkerTally, aggregate};
use super::worker::Worker;

/// Concurrent users and the request rate each of them keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProfile {
    pub users: usize,
    pub rps_per_user: u32,
}

impl LoadProfile {
    pub const fn new(users: usize, rps_per_user: u32) -> Self {
        Self {
            users,
            rps_per_user,
        }
    }

    /// Delay between request starts for one user; one second when the rate is 0.
    pub fn pace(&self) -> Duration {
        if self.rps_per_user == 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_secs_f64(1.0 / f64::from(self.rps_per_user))
        }
    }
}

/// Fork/join HTTP load against one target URL.
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    client: HttpClient,
    target_url: Option<Arc<str>>,
    request_timeout: Duration,
    stop: StopFlag,
}

impl LoadGenerator {
    /// `target_url` of `None` means no endpoint was discovered; load phases
    /// then finish immediately with an empty summary.
    pub fn new(target_url: Option<String>) -> Self {
        Self {
            client: HttpClient::default(),
            target_url: target_url.map(Arc::from),
            request_timeout: Duration::from_secs(10),
            stop: StopFlag::new(),
        }
    }

    /// Load generator for `http://<dns>/`.
    pub fn for_dns_name(dns_name: Option<&str>) -> Self {
        Self::new(dns_name.map(|dns| format!("http://{dns}/")))
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn target_url(&self) -> Option<&str> {
        self.target_url.as_deref()
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub async fn generate_load(&self, duration: Duration, profile: LoadProfile) -> LoadSummary {
        info!(
            "starting load test: {} users, {} RPS each, {}s duration",
            profile.users,
            profile.rps_per_user,
            duration.as_secs()
        );

        let Some(url) = self.target_url.clone() else {
            error!("load balancer DNS not available for load testing");
            return LoadSummary::default();
        };

        self.stop.activate();

        let started = Instant::now();
        let gate = Arc::new(DeadlineGate::after(started, duration, self.stop.clone()));

        let mut workers = JoinSet::new();
        for _ in 0..profile.users {
            let worker = Worker {
                client: self.client.clone(),
                url: url.clone(),
                gate: gate.clone(),
                pace: profile.pace(),
                request_timeout: self.request_timeout,
            };
            workers.spawn(worker.run());
        }

        let tallies = join_tallies(workers).await;
        self.stop.clear();

        let summary = aggregate(&tallies, started.elapsed());
        info!(
            "load test finished: {} requests ({} failed), {:.1}% success, {:.1} RPS",
            summary.total_requests,
            summary.failed_requests,
            summary.success_rate,
            summary.requests_per_second
        );
        summary
    }
}

/// Waits for every worker; a worker that panicked is logged and left out.
async fn join_tallies(mut workers: JoinSet<WorkerTally>) -> Vec<WorkerTally> {
    let mut tallies = Vec::with_capacity(workers.len());
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(tally) => tallies.push(tally),
            Err(err) => error!(%err, "load test worker failed"),
        }
    }
    tallies
}
