use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::http::HttpClient;

use super::gate::DeadlineGate;
use super::stats::WorkerTally;

pub(super) struct Worker {
    pub client: HttpClient,
    pub url: Arc<str>,
    pub gate: Arc<DeadlineGate>,
    /// Target time between request starts.
    pub pace: Duration,
    pub request_timeout: Duration,
}

impl Worker {
    pub async fn run(self) -> WorkerTally {
        let mut tally = WorkerTally::default();

        while self.gate.next() {
            let started = Instant::now();
            match self
                .client
                .get(&self.url, self.request_timeout)
                .await
            {
                Ok(res) if res.is_ok() => tally.record_success(started.elapsed()),
                Ok(res) => {
                    debug!(status = res.status, "request failed");
                    tally.record_failure();
                }
                Err(err) => {
                    debug!(%err, "request failed");
                    tally.record_failure();
                }
            }

            if let Some(rest) = self.pace.checked_sub(started.elapsed()) {
                tokio::time::sleep(rest).await;
            }
        }

        tally
    }
}
