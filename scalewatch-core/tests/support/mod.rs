#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scalewatch_core::cloud::{self, MetricsSink, ScalingControlPlane};
use scalewatch_core::{CapacitySnapshot, MetricSample, ScalingActivity};
use tokio::time::Instant;

#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<(String, Vec<MetricSample>)>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<(String, Vec<MetricSample>)> {
        match self.calls.lock() {
            Ok(v) => v.clone(),
            Err(err) => panic!("poisoned: {err}"),
        }
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn put_metric_data(&self, namespace: &str, batch: &[MetricSample]) -> cloud::Result<()> {
        match self.calls.lock() {
            Ok(mut v) => v.push((namespace.to_string(), batch.to_vec())),
            Err(err) => panic!("poisoned: {err}"),
        }
        Ok(())
    }
}

/// Autoscaling group whose desired capacity follows a timeline measured from
/// construction. Every step after the first also shows up as a scaling
/// activity.
pub struct TimelineGroup {
    started: Instant,
    timeline: Vec<(Duration, i32)>,
    cpu: Option<f64>,
    fail_capacity: AtomicBool,
    capacity_calls: AtomicUsize,
}

impl TimelineGroup {
    pub fn new(timeline: Vec<(Duration, i32)>) -> Self {
        Self {
            started: Instant::now(),
            timeline,
            cpu: Some(42.0),
            fail_capacity: AtomicBool::new(false),
            capacity_calls: AtomicUsize::new(0),
        }
    }

    pub fn steady(desired: i32) -> Self {
        Self::new(vec![(Duration::ZERO, desired)])
    }

    pub fn without_cpu(mut self) -> Self {
        self.cpu = None;
        self
    }

    pub fn fail_capacity_reads(&self, fail: bool) {
        self.fail_capacity.store(fail, Ordering::SeqCst);
    }

    pub fn capacity_calls(&self) -> usize {
        self.capacity_calls.load(Ordering::SeqCst)
    }

    fn reached(&self) -> usize {
        let elapsed = self.started.elapsed();
        self.timeline
            .iter()
            .take_while(|(at, _)| *at <= elapsed)
            .count()
    }

    fn desired_now(&self) -> i32 {
        let reached = self.reached().max(1);
        self.timeline
            .get(reached - 1)
            .map_or(0, |(_, desired)| *desired)
    }
}

#[async_trait]
impl ScalingControlPlane for TimelineGroup {
    async fn describe_capacity(&self, group: &str) -> cloud::Result<CapacitySnapshot> {
        self.capacity_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_capacity.load(Ordering::SeqCst) {
            return Err(cloud::Error::NotFound {
                kind: "auto scaling group",
                name: group.to_string(),
            });
        }

        let desired = self.desired_now();
        Ok(CapacitySnapshot {
            desired,
            min: 1,
            max: 10,
            current: desired.max(0) as usize,
            healthy: desired.max(0) as usize,
        })
    }

    async fn scaling_activities(
        &self,
        _group: &str,
        max_records: usize,
    ) -> cloud::Result<Vec<ScalingActivity>> {
        let reached = self.reached();
        let activities = self
            .timeline
            .windows(2)
            .take(reached.saturating_sub(1))
            .enumerate()
            .map(|(i, step)| {
                let (from, to) = (step[0].1, step[1].1);
                ScalingActivity {
                    id: format!("act-{i}"),
                    description: format!("Changing desired capacity from {from} to {to}"),
                    status_code: "Successful".to_string(),
                    cause: format!(
                        "At 2024-05-01T10:15:00Z a monitor alarm triggered policy XYZ-Policy changing the desired capacity from {from} to {to}."
                    ),
                    start_time: None,
                    desired_capacity: Some(to),
                }
            })
            .rev()
            .take(max_records)
            .collect();
        Ok(activities)
    }

    async fn average_cpu(&self, _group: &str, _window: Duration) -> cloud::Result<Option<f64>> {
        Ok(self.cpu)
    }
}
