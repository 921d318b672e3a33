mod support;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use scalewatch_core::{
    LoadGenerator, LoadProfile, ScalingTester, ScenarioConfig, TestKind, TestResult,
    TestSelection,
};
use scalewatch_testserver::TestServer;
use support::TimelineGroup;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn tester(group: Arc<TimelineGroup>) -> ScalingTester {
    ScalingTester::new(
        "XYZ-Corp-AutoScaling-Group",
        group,
        LoadGenerator::new(None),
        ScenarioConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn scale_down_from_four_to_two_succeeds() {
    let group = Arc::new(TimelineGroup::new(vec![
        (secs(0), 4),
        (secs(90), 3),
        (secs(200), 2),
    ]));

    let result = tester(group).run_scale_down_test(secs(600)).await;

    assert!(result.success);
    assert_eq!(result.wait_duration, 600);
    assert!(result.monitoring_results.scaling_detected);
    assert_eq!(result.monitoring_results.capacity_change, -2);
    assert_eq!(result.initial_state.capacity.map(|c| c.desired), Some(4));
    assert_eq!(result.final_state.capacity.map(|c| c.desired), Some(2));
    assert_eq!(result.initial_state.cpu_utilization, 42.0);
    assert_eq!(result.scaling_activities.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn scale_up_succeeds_when_capacity_grows() {
    let group = Arc::new(TimelineGroup::new(vec![(secs(0), 2), (secs(120), 4)]));

    let result = tester(group).run_scale_up_test(secs(300)).await;

    assert!(result.success);
    assert_eq!(result.duration, 300);
    assert_eq!(result.monitoring_results.capacity_change, 2);
    // load duration plus the default grace period
    assert_eq!(result.monitoring_results.monitoring_duration, 600);
    assert_eq!(result.load_test_results.total_requests, 0);
}

#[tokio::test(start_paused = true)]
async fn scale_up_fails_when_capacity_shrinks_or_holds() {
    let shrinking = Arc::new(TimelineGroup::new(vec![(secs(0), 3), (secs(60), 2)]));
    let result = tester(shrinking).run_scale_up_test(secs(60)).await;
    assert!(result.monitoring_results.scaling_detected);
    assert!(!result.success);

    let steady = Arc::new(TimelineGroup::steady(3));
    let result = tester(steady).run_scale_up_test(secs(60)).await;
    assert!(!result.monitoring_results.scaling_detected);
    assert!(!result.success);
}

#[tokio::test(start_paused = true)]
async fn scale_down_without_change_fails() {
    let group = Arc::new(TimelineGroup::steady(2).without_cpu());

    let result = tester(group).run_scale_down_test(secs(120)).await;

    assert!(!result.success);
    assert_eq!(result.monitoring_results.capacity_change, 0);
    assert_eq!(result.initial_state.cpu_utilization, 0.0);
}

#[tokio::test(start_paused = true)]
async fn stress_records_highest_capacity() {
    let group = Arc::new(TimelineGroup::new(vec![
        (secs(0), 2),
        (secs(100), 5),
        (secs(400), 3),
    ]));

    let result = tester(group).run_stress_test(secs(600)).await;

    assert_eq!(result.max_capacity_reached, 5);
    assert_eq!(result.monitoring_results.peak_desired_capacity, Some(5));
    assert_eq!(result.initial_capacity.map(|c| c.desired), Some(2));
    assert_eq!(result.final_capacity.map(|c| c.desired), Some(3));
    assert_eq!(result.load_phases.heavy_load.total_requests, 0);
}

#[tokio::test(start_paused = true)]
async fn stress_falls_back_to_baseline_or_zero() {
    let steady = Arc::new(TimelineGroup::steady(3));
    let result = tester(steady).run_stress_test(secs(60)).await;
    assert!(result.scaling_activities.is_empty());
    assert_eq!(result.max_capacity_reached, 3);

    let unreachable = Arc::new(TimelineGroup::steady(3));
    unreachable.fail_capacity_reads(true);
    let result = tester(unreachable).run_stress_test(secs(60)).await;
    assert_eq!(result.initial_capacity, None);
    assert_eq!(result.max_capacity_reached, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_capacity_reads_do_not_look_like_scaling() {
    let group = Arc::new(TimelineGroup::steady(4));
    group.fail_capacity_reads(true);

    let result = tester(group.clone()).run_scale_down_test(secs(120)).await;

    assert!(!result.success);
    assert!(!result.monitoring_results.scaling_detected);
    assert_eq!(result.initial_state.capacity, None);
    assert!(group.capacity_calls() > 2);
}

#[tokio::test(start_paused = true)]
async fn run_all_executes_in_order() {
    let group = Arc::new(TimelineGroup::steady(2));
    let mut results = Vec::new();

    tester(group)
        .run_selected(TestSelection::All, secs(60), &mut results)
        .await;

    let kinds: Vec<TestKind> = results.iter().map(TestResult::kind).collect();
    assert_eq!(
        kinds,
        vec![TestKind::ScaleUp, TestKind::ScaleDown, TestKind::Stress]
    );

    match &results[1] {
        TestResult::ScaleDown(r) => assert_eq!(r.wait_duration, 120),
        other => panic!("unexpected result: {other:?}"),
    }
    match &results[2] {
        TestResult::Stress(r) => assert_eq!(r.duration, 120),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn interrupted_run_keeps_completed_results() {
    let group = Arc::new(TimelineGroup::steady(2));
    let tester = tester(group);
    let mut results = Vec::new();

    // scale-up monitors for 300 + 300s; the interrupt lands during scale-down
    tokio::select! {
        () = tester.run_selected(TestSelection::All, secs(300), &mut results) => {
            panic!("run should have been interrupted");
        }
        () = tokio::time::sleep(secs(700)) => {}
    }

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), TestKind::ScaleUp);
}

#[tokio::test(start_paused = true)]
async fn single_selection_runs_one_scenario() {
    let group = Arc::new(TimelineGroup::steady(2));
    let mut results = Vec::new();

    tester(group)
        .run_selected(TestSelection::ScaleDown, secs(30), &mut results)
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), TestKind::ScaleDown);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scale_up_polls_while_load_is_running() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let group = Arc::new(TimelineGroup::new(vec![
        (Duration::ZERO, 2),
        (Duration::from_millis(1500), 3),
    ]));
    let config = ScenarioConfig {
        poll_interval: secs(1),
        monitor_grace: secs(1),
        scale_up_load: LoadProfile::new(2, 5),
        ..ScenarioConfig::default()
    };
    let tester = ScalingTester::new(
        "XYZ-Corp-AutoScaling-Group",
        group.clone(),
        LoadGenerator::new(Some(server.urls().root.clone())),
        config,
    );

    let started = std::time::Instant::now();
    let (result, (calls_mid_load, requests_mid_load)) = tokio::join!(
        tester.run_scale_up_test(secs(2)),
        async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            (group.capacity_calls(), server.stats().requests_total())
        }
    );
    let elapsed = started.elapsed();

    // state read, monitor baseline and polls at 0s and 1s, all before the
    // load window closes at 2s
    assert!(calls_mid_load >= 3, "capacity calls mid-load: {calls_mid_load}");
    assert!(requests_mid_load > 0);

    // monitor window of 3s with the 2s load inside it, not 5s back to back
    assert!(elapsed >= secs(3));
    assert!(elapsed < Duration::from_millis(4500), "took {elapsed:?}");

    let load = &result.load_test_results;
    assert!(load.total_requests > 0);
    assert_eq!(load.total_requests, server.stats().requests_total());
    assert_eq!(load.failed_requests, 0);

    assert!(result.success);
    assert_eq!(result.monitoring_results.capacity_change, 1);
    assert_eq!(result.monitoring_results.monitoring_duration, 3);

    server.shutdown().await;
    Ok(())
}
