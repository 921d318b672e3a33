//! Final JSON report of a tester run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::info;

use crate::scaling::{TestKind, TestResult};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub region: String,
    pub asg_name: String,
    pub alb_dns: Option<String>,
    pub total_tests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KindSummary {
    pub count: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    /// Percent.
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_up_results: Option<KindSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_results: Option<KindSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_test_results: Option<KindSummary>,
}

impl TestSummary {
    pub fn for_kind(&self, kind: TestKind) -> Option<KindSummary> {
        match kind {
            TestKind::ScaleUp => self.scale_up_results,
            TestKind::ScaleDown => self.scale_down_results,
            TestKind::Stress => self.stress_test_results,
        }
    }
}

fn passed(results: &[&TestResult]) -> usize {
    results
        .iter()
        .filter(|r| r.success() == Some(true))
        .count()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Only an explicit pass counts as successful; stress runs count as failed.
pub fn summarize(results: &[TestResult]) -> TestSummary {
    let all: Vec<&TestResult> = results.iter().collect();
    let successful_tests = passed(&all);

    let mut summary = TestSummary {
        total_tests: results.len(),
        successful_tests,
        failed_tests: results.len() - successful_tests,
        success_rate: percent(successful_tests, results.len()),
        scale_up_results: None,
        scale_down_results: None,
        stress_test_results: None,
    };

    for kind in TestKind::iter() {
        let of_kind: Vec<&TestResult> = results.iter().filter(|r| r.kind() == kind).collect();
        if of_kind.is_empty() {
            continue;
        }
        let entry = Some(KindSummary {
            count: of_kind.len(),
            success_rate: percent(passed(&of_kind), of_kind.len()),
        });
        match kind {
            TestKind::ScaleUp => summary.scale_up_results = entry,
            TestKind::ScaleDown => summary.scale_down_results = entry,
            TestKind::Stress => summary.stress_test_results = entry,
        }
    }

    summary
}

/// `scaling-test-report-YYYYMMDD-HHMMSS.json`
pub fn default_report_filename(now: DateTime<Local>) -> String {
    format!("scaling-test-report-{}.json", now.format("%Y%m%d-%H%M%S"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub report_metadata: ReportMetadata,
    pub test_results: Vec<TestResult>,
    pub summary: TestSummary,
}

impl TestReport {
    pub fn new(
        region: impl Into<String>,
        asg_name: impl Into<String>,
        alb_dns: Option<String>,
        test_results: Vec<TestResult>,
    ) -> Self {
        let summary = summarize(&test_results);
        Self {
            report_metadata: ReportMetadata {
                generated_at: Utc::now(),
                region: region.into(),
                asg_name: asg_name.into(),
                alb_dns,
                total_tests: test_results.len(),
            },
            test_results,
            summary,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub async fn write(&self, path: &Path) -> Result<(), Error> {
        let json = self.to_json_pretty()?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        info!("test report generated: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::load::LoadSummary;
    use crate::scaling::{GroupState, LoadPhases, MonitorResult, ScaleDownResult, ScaleUpResult, StressResult};

    fn monitoring(change: i32) -> MonitorResult {
        MonitorResult {
            scaling_detected: change != 0,
            initial_capacity: None,
            final_capacity: None,
            capacity_change: change,
            new_activities: 0,
            peak_desired_capacity: None,
            monitoring_duration: 600,
        }
    }

    fn state() -> GroupState {
        GroupState {
            capacity: None,
            cpu_utilization: 0.0,
        }
    }

    fn scale_up(success: bool) -> TestResult {
        TestResult::ScaleUp(ScaleUpResult {
            timestamp: Utc::now(),
            duration: 300,
            initial_state: state(),
            final_state: state(),
            load_test_results: LoadSummary::default(),
            monitoring_results: monitoring(i32::from(success)),
            scaling_activities: Vec::new(),
            success,
        })
    }

    fn scale_down(success: bool) -> TestResult {
        TestResult::ScaleDown(ScaleDownResult {
            timestamp: Utc::now(),
            wait_duration: 600,
            initial_state: state(),
            final_state: state(),
            monitoring_results: monitoring(if success { -1 } else { 0 }),
            scaling_activities: Vec::new(),
            success,
        })
    }

    fn stress() -> TestResult {
        TestResult::Stress(StressResult {
            timestamp: Utc::now(),
            duration: 600,
            initial_capacity: None,
            final_capacity: None,
            load_phases: LoadPhases {
                light_load: LoadSummary::default(),
                medium_load: LoadSummary::default(),
                heavy_load: LoadSummary::default(),
            },
            monitoring_results: monitoring(0),
            scaling_activities: Vec::new(),
            max_capacity_reached: 2,
        })
    }

    #[test]
    fn summary_counts_only_explicit_passes() {
        let summary = summarize(&[scale_up(true), scale_down(false), stress()]);

        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.successful_tests, 1);
        assert_eq!(summary.failed_tests, 2);
        assert!((summary.success_rate - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(
            summary.for_kind(TestKind::ScaleUp),
            Some(KindSummary {
                count: 1,
                success_rate: 100.0
            })
        );
        assert_eq!(
            summary.for_kind(TestKind::ScaleDown),
            Some(KindSummary {
                count: 1,
                success_rate: 0.0
            })
        );
        assert_eq!(
            summary.for_kind(TestKind::Stress),
            Some(KindSummary {
                count: 1,
                success_rate: 0.0
            })
        );
    }

    #[test]
    fn absent_kinds_are_omitted() {
        let summary = summarize(&[scale_down(true), scale_down(true)]);
        assert_eq!(summary.scale_up_results, None);
        assert_eq!(summary.stress_test_results, None);
        assert_eq!(summary.success_rate, 100.0);

        let json = match serde_json::to_value(&summary) {
            Ok(v) => v,
            Err(err) => panic!("serialize: {err}"),
        };
        assert!(json.get("scale_up_results").is_none());
        assert_eq!(json["scale_down_results"]["count"], 2);
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_tests, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn default_filename_uses_local_timestamp() {
        let now = match Local.with_ymd_and_hms(2024, 5, 1, 9, 7, 3).single() {
            Some(t) => t,
            None => panic!("ambiguous local time"),
        };
        assert_eq!(
            default_report_filename(now),
            "scaling-test-report-20240501-090703.json"
        );
    }

    #[test]
    fn report_metadata_matches_results() {
        let report = TestReport::new(
            "us-east-1",
            "XYZ-Corp-AutoScaling-Group",
            None,
            vec![scale_up(false)],
        );
        assert_eq!(report.report_metadata.total_tests, 1);

        let json = match report.to_json_pretty() {
            Ok(j) => j,
            Err(err) => panic!("serialize: {err}"),
        };
        assert!(json.contains("\n  \"report_metadata\""));
        assert!(json.contains("\"test_type\": \"scale_up\""));
        assert!(json.contains("\"alb_dns\": null"));
    }
}
