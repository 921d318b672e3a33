use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cloud::ScalingControlPlane;
use crate::load::{LoadGenerator, LoadProfile, LoadSummary};

use super::activity::{CapacitySnapshot, ScalingActivity};
use super::monitor::{MonitorResult, monitor_scaling_event};
use super::probe::GroupProbe;

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub poll_interval: Duration,
    /// Extra monitoring time after the load ends, for policies with cooldowns.
    pub monitor_grace: Duration,
    pub cpu_window: Duration,
    pub scale_up_load: LoadProfile,
    pub stress_light: LoadProfile,
    pub stress_medium: LoadProfile,
    pub stress_heavy: LoadProfile,
    /// Activities fetched by the monitor on every poll.
    pub monitor_activity_window: usize,
    /// Recent activities attached to scale-up and scale-down results.
    pub scale_activity_window: usize,
    pub stress_activity_window: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            monitor_grace: Duration::from_secs(300),
            cpu_window: Duration::from_secs(5 * 60),
            scale_up_load: LoadProfile::new(20, 5),
            stress_light: LoadProfile::new(10, 10),
            stress_medium: LoadProfile::new(20, 10),
            stress_heavy: LoadProfile::new(50, 10),
            monitor_activity_window: 10,
            scale_activity_window: 5,
            stress_activity_window: 10,
        }
    }
}

impl ScenarioConfig {
    /// Load time plus the grace period, saturating at `Duration::MAX`.
    pub fn monitoring_window(&self, load: Duration) -> Duration {
        load.saturating_add(self.monitor_grace)
    }
}

/// Scale-down waits and stress runs last twice the base duration.
pub fn extended_duration(duration: Duration) -> Duration {
    duration.saturating_mul(2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupState {
    pub capacity: Option<CapacitySnapshot>,
    pub cpu_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleUpResult {
    pub timestamp: DateTime<Utc>,
    /// Seconds of load.
    pub duration: u64,
    pub initial_state: GroupState,
    pub final_state: GroupState,
    pub load_test_results: LoadSummary,
    pub monitoring_results: MonitorResult,
    pub scaling_activities: Vec<ScalingActivity>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleDownResult {
    pub timestamp: DateTime<Utc>,
    /// Seconds.
    pub wait_duration: u64,
    pub initial_state: GroupState,
    pub final_state: GroupState,
    pub monitoring_results: MonitorResult,
    pub scaling_activities: Vec<ScalingActivity>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadPhases {
    pub light_load: LoadSummary,
    pub medium_load: LoadSummary,
    pub heavy_load: LoadSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressResult {
    pub timestamp: DateTime<Utc>,
    /// Seconds, all three phases together.
    pub duration: u64,
    pub initial_capacity: Option<CapacitySnapshot>,
    pub final_capacity: Option<CapacitySnapshot>,
    pub load_phases: LoadPhases,
    pub monitoring_results: MonitorResult,
    pub scaling_activities: Vec<ScalingActivity>,
    pub max_capacity_reached: i32,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TestKind {
    ScaleUp,
    ScaleDown,
    #[strum(serialize = "stress_test")]
    Stress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "test_type", rename_all = "snake_case")]
pub enum TestResult {
    ScaleUp(ScaleUpResult),
    ScaleDown(ScaleDownResult),
    #[serde(rename = "stress_test")]
    Stress(StressResult),
}

impl TestResult {
    pub fn kind(&self) -> TestKind {
        match self {
            Self::ScaleUp(_) => TestKind::ScaleUp,
            Self::ScaleDown(_) => TestKind::ScaleDown,
            Self::Stress(_) => TestKind::Stress,
        }
    }

    /// Pass/fail verdict; stress runs only record observations.
    pub fn success(&self) -> Option<bool> {
        match self {
            Self::ScaleUp(r) => Some(r.success),
            Self::ScaleDown(r) => Some(r.success),
            Self::Stress(_) => None,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum TestSelection {
    ScaleUp,
    ScaleDown,
    Stress,
    #[default]
    All,
}

impl TestSelection {
    pub fn includes(self, kind: TestKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::ScaleUp, TestKind::ScaleUp)
                | (Self::ScaleDown, TestKind::ScaleDown)
                | (Self::Stress, TestKind::Stress)
        )
    }
}

/// Runs scaling scenarios against one group, with load aimed at one endpoint.
pub struct ScalingTester {
    probe: GroupProbe,
    load: LoadGenerator,
    config: ScenarioConfig,
}

impl ScalingTester {
    pub fn new(
        group: impl Into<String>,
        control: Arc<dyn ScalingControlPlane>,
        load: LoadGenerator,
        config: ScenarioConfig,
    ) -> Self {
        Self {
            probe: GroupProbe::new(group, control),
            load,
            config,
        }
    }

    pub fn load_generator(&self) -> &LoadGenerator {
        &self.load
    }

    pub fn probe(&self) -> &GroupProbe {
        &self.probe
    }

    async fn group_state(&self) -> GroupState {
        GroupState {
            capacity: self.probe.current_capacity().await,
            cpu_utilization: self.probe.cpu_utilization(self.config.cpu_window).await,
        }
    }

    async fn monitor(&self, timeout: Duration) -> MonitorResult {
        monitor_scaling_event(
            &self.probe,
            timeout,
            self.config.poll_interval,
            self.config.monitor_activity_window,
        )
        .await
    }

    /// Drives high load for `duration` while watching for a scale-out.
    pub async fn run_scale_up_test(&self, duration: Duration) -> ScaleUpResult {
        info!("starting scale-up test");

        let initial_state = self.group_state().await;
        log_state("initial", &initial_state);

        let (monitoring_results, load_test_results) = tokio::join!(
            self.monitor(self.config.monitoring_window(duration)),
            self.load.generate_load(duration, self.config.scale_up_load),
        );

        let final_state = self.group_state().await;
        let scaling_activities = self
            .probe
            .scaling_activities(self.config.scale_activity_window)
            .await;

        let success = monitoring_results.scaling_detected && monitoring_results.capacity_change > 0;
        ScaleUpResult {
            timestamp: Utc::now(),
            duration: duration.as_secs(),
            initial_state,
            final_state,
            load_test_results,
            monitoring_results,
            scaling_activities,
            success,
        }
    }

    /// Applies no load for `wait` and watches for a scale-in.
    pub async fn run_scale_down_test(&self, wait: Duration) -> ScaleDownResult {
        info!("starting scale-down test");

        let initial_state = self.group_state().await;
        log_state("initial", &initial_state);

        info!("waiting {}s for scale-down to occur", wait.as_secs());
        let monitoring_results = self.monitor(wait).await;

        let final_state = self.group_state().await;
        let scaling_activities = self
            .probe
            .scaling_activities(self.config.scale_activity_window)
            .await;

        let success = monitoring_results.scaling_detected && monitoring_results.capacity_change < 0;
        ScaleDownResult {
            timestamp: Utc::now(),
            wait_duration: wait.as_secs(),
            initial_state,
            final_state,
            monitoring_results,
            scaling_activities,
            success,
        }
    }

    /// Three escalating load phases of `duration / 3` each.
    pub async fn run_stress_test(&self, duration: Duration) -> StressResult {
        info!("starting stress test");

        let initial_capacity = self.probe.current_capacity().await;
        let phase = duration / 3;

        let phases = async {
            info!("phase 1: light load");
            let light_load = self.load.generate_load(phase, self.config.stress_light).await;
            info!("phase 2: medium load");
            let medium_load = self.load.generate_load(phase, self.config.stress_medium).await;
            info!("phase 3: heavy load");
            let heavy_load = self.load.generate_load(phase, self.config.stress_heavy).await;
            LoadPhases {
                light_load,
                medium_load,
                heavy_load,
            }
        };

        let (monitoring_results, load_phases) =
            tokio::join!(self.monitor(self.config.monitoring_window(duration)), phases);

        let final_capacity = self.probe.current_capacity().await;
        let scaling_activities = self
            .probe
            .scaling_activities(self.config.stress_activity_window)
            .await;

        let max_capacity_reached = max_capacity_reached(
            &scaling_activities,
            &monitoring_results,
            initial_capacity,
        );

        StressResult {
            timestamp: Utc::now(),
            duration: duration.as_secs(),
            initial_capacity,
            final_capacity,
            load_phases,
            monitoring_results,
            scaling_activities,
            max_capacity_reached,
        }
    }

    /// Runs the selected scenarios in order, appending each result as soon as
    /// it completes. Scale-down waits and stress runs last twice `duration`.
    pub async fn run_selected(
        &self,
        selection: TestSelection,
        duration: Duration,
        results: &mut Vec<TestResult>,
    ) {
        if selection.includes(TestKind::ScaleUp) {
            let result = self.run_scale_up_test(duration).await;
            log_verdict("scale-up", result.success);
            results.push(TestResult::ScaleUp(result));
        }

        if selection.includes(TestKind::ScaleDown) {
            let result = self.run_scale_down_test(extended_duration(duration)).await;
            log_verdict("scale-down", result.success);
            results.push(TestResult::ScaleDown(result));
        }

        if selection.includes(TestKind::Stress) {
            let result = self.run_stress_test(extended_duration(duration)).await;
            info!(
                max_capacity = result.max_capacity_reached,
                "stress test completed"
            );
            results.push(TestResult::Stress(result));
        }
    }
}

fn max_capacity_reached(
    activities: &[ScalingActivity],
    monitoring: &MonitorResult,
    baseline: Option<CapacitySnapshot>,
) -> i32 {
    activities
        .iter()
        .filter_map(|a| a.desired_capacity)
        .chain(monitoring.peak_desired_capacity)
        .max()
        .or(baseline.map(|c| c.desired))
        .unwrap_or(0)
}

fn log_state(label: &str, state: &GroupState) {
    match state.capacity {
        Some(c) => info!(
            "{label} state: desired {} (min {}, max {}), {} instances ({} healthy), CPU {:.2}%",
            c.desired, c.min, c.max, c.current, c.healthy, state.cpu_utilization
        ),
        None => info!(
            "{label} state: capacity unknown, CPU {:.2}%",
            state.cpu_utilization
        ),
    }
}

fn log_verdict(name: &str, success: bool) {
    if success {
        info!("{name} test PASSED");
    } else {
        warn!("{name} test FAILED");
    }
}
