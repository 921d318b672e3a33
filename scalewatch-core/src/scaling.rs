mod activity;
mod monitor;
mod probe;
mod scenario;

pub use activity::{CapacitySnapshot, ScalingActivity, desired_capacity_from_cause};
pub use monitor::{MonitorResult, monitor_scaling_event};
pub use probe::GroupProbe;
pub use scenario::{
    GroupState, LoadPhases, ScaleDownResult, ScaleUpResult, ScalingTester, ScenarioConfig,
    StressResult, TestKind, TestResult, TestSelection, extended_duration,
};
