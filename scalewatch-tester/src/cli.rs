use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use scalewatch_core::{ScenarioConfig, TestSelection, parse_duration};
use strum::VariantNames as _;

fn parse_test_type(input: &str) -> Result<TestSelection, String> {
    input.trim().parse().map_err(|_| {
        format!(
            "invalid test type '{input}' (expected one of: {})",
            TestSelection::VARIANTS.join(", ")
        )
    })
}

fn parse_positive_duration(input: &str) -> Result<Duration, String> {
    let d = parse_duration(input)?;
    if d.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(d)
}

/// Base duration whose longest derived window (twice the base plus the
/// monitoring grace) still fits in a `Duration`.
fn parse_test_duration(input: &str) -> Result<Duration, String> {
    let d = parse_positive_duration(input)?;
    d.checked_mul(2)
        .and_then(|long| long.checked_add(ScenarioConfig::default().monitor_grace))
        .ok_or_else(|| format!("duration '{input}' is too large"))?;
    Ok(d)
}

#[derive(Debug, Parser)]
#[command(
    name = "scalewatch-tester",
    author,
    version,
    about = "Validate autoscaling policies with synthetic load",
    long_about = "Drives HTTP load against an application load balancer while polling an Auto Scaling group, then writes a JSON report of how the group reacted.\n\nScale-down waits and stress runs last twice --duration; scale-up and stress keep monitoring for five minutes after the load ends.",
    after_help = "Examples:\n  scalewatch-tester --test-type scale-up --duration 5m\n  scalewatch-tester --alb-dns my-alb-123.us-east-1.elb.amazonaws.com --report-file report.json"
)]
pub struct Cli {
    /// AWS region
    #[arg(long, env = "SCALEWATCH_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Auto Scaling group under test
    #[arg(long, env = "SCALEWATCH_ASG_NAME", default_value = "XYZ-Corp-AutoScaling-Group")]
    pub asg_name: String,

    /// Load balancer DNS name (discovered from --alb-name when omitted)
    #[arg(long, env = "SCALEWATCH_ALB_DNS")]
    pub alb_dns: Option<String>,

    /// Load balancer looked up when --alb-dns is omitted
    #[arg(long, env = "SCALEWATCH_ALB_NAME", default_value = "XYZ-Corp-LoadBalancer")]
    pub alb_name: String,

    /// Scenario to run: scale-up, scale-down, stress or all
    #[arg(long, env = "SCALEWATCH_TEST_TYPE", default_value = "all", value_parser = parse_test_type)]
    pub test_type: TestSelection,

    /// Base test duration (e.g. 300, 90s, 5m)
    #[arg(long, env = "SCALEWATCH_DURATION", default_value = "300", value_parser = parse_test_duration)]
    pub duration: Duration,

    /// Report path (defaults to scaling-test-report-<timestamp>.json)
    #[arg(long, env = "SCALEWATCH_REPORT_FILE")]
    pub report_file: Option<PathBuf>,

    /// Time between capacity polls while monitoring
    #[arg(long, env = "SCALEWATCH_POLL_INTERVAL", default_value = "30", value_parser = parse_positive_duration)]
    pub poll_interval: Duration,
}
