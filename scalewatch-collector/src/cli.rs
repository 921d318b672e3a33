use std::time::Duration;

use clap::Parser;
use scalewatch_core::metrics::{DEFAULT_HEALTH_URL, DEFAULT_METADATA_URL, MAX_BATCH_SIZE};
use scalewatch_core::parse_duration;

fn parse_batch_size(input: &str) -> Result<usize, String> {
    let n: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid batch size '{input}'"))?;
    if n == 0 || n > MAX_BATCH_SIZE {
        return Err(format!("batch size must be between 1 and {MAX_BATCH_SIZE}"));
    }
    Ok(n)
}

fn parse_interval(input: &str) -> Result<Duration, String> {
    let d = parse_duration(input)?;
    if d.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(d)
}

#[derive(Debug, Parser)]
#[command(
    name = "scalewatch-collector",
    author,
    version,
    about = "Publish host and application metrics as CloudWatch custom metrics",
    long_about = "Collects memory, disk, connection and load-average readings from the local host plus a health probe of the local application, then publishes them to a CloudWatch namespace tagged with the EC2 instance id.\n\nEvery flag can also be set through the matching SCALEWATCH_* environment variable.",
    after_help = "Examples:\n  scalewatch-collector\n  scalewatch-collector --continuous --interval 60\n  scalewatch-collector --dry-run --health-url http://localhost:8080/health"
)]
pub struct Cli {
    /// AWS region
    #[arg(long, env = "SCALEWATCH_REGION", default_value = "us-east-1")]
    pub region: String,

    /// CloudWatch namespace for the custom metrics
    #[arg(long, env = "SCALEWATCH_NAMESPACE", default_value = "XYZ/Application")]
    pub namespace: String,

    /// Keep collecting every --interval until interrupted
    #[arg(long, env = "SCALEWATCH_CONTINUOUS")]
    pub continuous: bool,

    /// Time between collections in continuous mode (e.g. 300, 90s, 5m)
    #[arg(long, env = "SCALEWATCH_INTERVAL", default_value = "300", value_parser = parse_interval)]
    pub interval: Duration,

    /// Application health endpoint probed for health and response time
    #[arg(long, env = "SCALEWATCH_HEALTH_URL", default_value = DEFAULT_HEALTH_URL)]
    pub health_url: String,

    /// Instance metadata endpoint returning the instance id
    #[arg(long, env = "SCALEWATCH_METADATA_URL", default_value = DEFAULT_METADATA_URL)]
    pub metadata_url: String,

    /// Samples per PutMetricData call (1-20)
    #[arg(long, env = "SCALEWATCH_BATCH_SIZE", default_value = "20", value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// Log the samples instead of publishing them
    #[arg(long, env = "SCALEWATCH_DRY_RUN")]
    pub dry_run: bool,
}
