use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Shared "load test active" switch. Workers check it once per iteration;
/// clearing it stops them cooperatively after their in-flight request.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    active: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Decides whether a worker may start another request.
#[derive(Debug)]
pub struct DeadlineGate {
    /// `None` when the deadline lies beyond what `Instant` can represent.
    deadline: Option<Instant>,
    stop: StopFlag,
}

impl DeadlineGate {
    pub fn new(deadline: Option<Instant>, stop: StopFlag) -> Self {
        Self { deadline, stop }
    }

    /// Gate closing `duration` after `started`.
    pub fn after(started: Instant, duration: Duration, stop: StopFlag) -> Self {
        Self::new(started.checked_add(duration), stop)
    }

    pub fn next(&self) -> bool {
        self.stop.is_active() && self.deadline.is_none_or(|deadline| Instant::now() < deadline)
    }
}
