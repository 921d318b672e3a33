mod collector;
mod host;
mod sample;
mod sink;
mod sources;

pub use collector::{
    CollectorConfig, DEFAULT_HEALTH_URL, DEFAULT_METADATA_URL, MAX_BATCH_SIZE, MetricsCollector,
    UNKNOWN_INSTANCE, resolve_instance_id, run_continuous,
};
pub use host::{HostError, HostProbe, HostReadings, SysinfoHost};
pub use sample::{Dimension, MetricSample, MetricUnit};
pub use sink::LogSink;
pub use sources::{ClockErrorRate, ClockSessions, SampleSource};
