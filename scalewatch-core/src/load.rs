mod gate;
mod generator;
mod stats;
mod worker;

pub use gate::{DeadlineGate, StopFlag};
pub use generator::{LoadGenerator, LoadProfile};
pub use stats::{LoadSummary, P95_MIN_SAMPLES, WorkerTally, aggregate, mean, p95};
