pub mod cloud;
pub mod duration;
pub mod http;
pub mod load;
pub mod metrics;
pub mod report;
pub mod scaling;

pub use duration::parse_duration;
pub use http::{HttpClient, HttpResponse};
pub use load::{LoadGenerator, LoadProfile, LoadSummary, StopFlag};
pub use metrics::{CollectorConfig, MetricSample, MetricUnit, MetricsCollector};
pub use report::TestReport;
pub use scaling::{
    CapacitySnapshot, GroupProbe, MonitorResult, ScalingActivity, ScalingTester, ScenarioConfig,
    TestKind, TestResult, TestSelection,
};
