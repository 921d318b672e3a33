use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Local;
use scalewatch_aws::{AutoScalingControlPlane, ElbDirectory, load_sdk_config};
use scalewatch_core::cloud::{LoadBalancerDirectory, ScalingControlPlane};
use scalewatch_core::report::default_report_filename;
use scalewatch_core::{LoadGenerator, ScalingTester, ScenarioConfig, TestReport};
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::exit_codes::ExitCode;
use crate::run_error::RunError;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let sdk = load_sdk_config(&cli.region).await;
    let control = Arc::new(AutoScalingControlPlane::new(&sdk));
    let directory = ElbDirectory::new(&sdk);

    execute(&cli, control, &directory, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

fn report_path(cli: &Cli) -> Result<PathBuf, RunError> {
    let Some(path) = cli.report_file.clone() else {
        return Ok(PathBuf::from(default_report_filename(Local::now())));
    };

    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            Err(RunError::InvalidInput(anyhow::anyhow!(
                "report directory does not exist: {}",
                dir.display()
            )))
        }
        _ => Ok(path),
    }
}

async fn resolve_alb_dns(cli: &Cli, directory: &dyn LoadBalancerDirectory) -> Option<String> {
    if let Some(dns) = &cli.alb_dns {
        return Some(dns.clone());
    }

    match directory.dns_name(&cli.alb_name).await {
        Ok(Some(dns)) => {
            info!(alb = %cli.alb_name, dns = %dns, "discovered load balancer");
            Some(dns)
        }
        Ok(None) => None,
        Err(err) => {
            error!(%err, alb = %cli.alb_name, "could not discover load balancer DNS");
            None
        }
    }
}

pub(crate) async fn execute<S>(
    cli: &Cli,
    control: Arc<dyn ScalingControlPlane>,
    directory: &dyn LoadBalancerDirectory,
    interrupt: S,
) -> Result<ExitCode, RunError>
where
    S: Future<Output = ()>,
{
    let path = report_path(cli)?;

    let alb_dns = resolve_alb_dns(cli, directory).await;
    if alb_dns.is_none() {
        warn!("load balancer DNS not available, load testing will be limited");
    }

    let config = ScenarioConfig {
        poll_interval: cli.poll_interval,
        ..ScenarioConfig::default()
    };
    let tester = ScalingTester::new(
        cli.asg_name.clone(),
        control,
        LoadGenerator::for_dns_name(alb_dns.as_deref()),
        config,
    );
    let stop = tester.load_generator().stop_flag().clone();

    info!(
        "running {} test(s) against {} in {}",
        cli.test_type, cli.asg_name, cli.region
    );

    let mut results = Vec::new();
    tokio::select! {
        () = tester.run_selected(cli.test_type, cli.duration, &mut results) => {}
        () = interrupt => {
            info!("test interrupted by user");
            stop.clear();
        }
    }

    if results.is_empty() {
        warn!("no test results to report");
        return Ok(ExitCode::Failure);
    }

    let report = TestReport::new(cli.region.clone(), cli.asg_name.clone(), alb_dns, results);
    write_report(&report, &path).await?;

    let summary = &report.summary;
    info!("scaling test completed, report saved to {}", path.display());
    info!("overall success rate: {:.1}%", summary.success_rate);
    info!(
        "successful tests: {}/{}",
        summary.successful_tests, summary.total_tests
    );

    Ok(ExitCode::Success)
}

async fn write_report(report: &TestReport, path: &Path) -> Result<(), RunError> {
    report
        .write(path)
        .await
        .context("failed to write test report")
        .map_err(RunError::RuntimeError)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use clap::Parser as _;
    use scalewatch_core::cloud;
    use scalewatch_core::{CapacitySnapshot, ScalingActivity};

    use super::*;

    struct SteadyGroup(i32);

    #[async_trait]
    impl ScalingControlPlane for SteadyGroup {
        async fn describe_capacity(&self, _group: &str) -> cloud::Result<CapacitySnapshot> {
            Ok(CapacitySnapshot {
                desired: self.0,
                min: 1,
                max: 10,
                current: 0,
                healthy: 0,
            })
        }

        async fn scaling_activities(
            &self,
            _group: &str,
            _max_records: usize,
        ) -> cloud::Result<Vec<ScalingActivity>> {
            Ok(Vec::new())
        }

        async fn average_cpu(&self, _group: &str, _window: Duration) -> cloud::Result<Option<f64>> {
            Ok(Some(12.5))
        }
    }

    enum Directory {
        Found(&'static str),
        Missing,
        Broken,
    }

    #[async_trait]
    impl LoadBalancerDirectory for Directory {
        async fn dns_name(&self, name: &str) -> cloud::Result<Option<String>> {
            match self {
                Self::Found(dns) => Ok(Some((*dns).to_string())),
                Self::Missing => Ok(None),
                Self::Broken => Err(cloud::Error::backend(
                    "elbv2",
                    "DescribeLoadBalancers",
                    format!("access denied for {name}"),
                )),
            }
        }
    }

    fn cli(args: &[&str]) -> Cli {
        match Cli::try_parse_from(std::iter::once("scalewatch-tester").chain(args.iter().copied()))
        {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(err) => panic!("read report: {err}"),
        };
        match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(err) => panic!("parse report: {err}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_writes_report_and_succeeds() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");
        let path_arg = path.display().to_string();
        let cli = cli(&[
            "--test-type",
            "scale-down",
            "--duration",
            "60",
            "--report-file",
            &path_arg,
        ]);

        let code = execute(
            &cli,
            Arc::new(SteadyGroup(3)),
            &Directory::Found("alb-123.us-east-1.elb.amazonaws.com"),
            std::future::pending(),
        )
        .await?;

        assert_eq!(code, ExitCode::Success);
        let json = read_json(&path);
        assert_eq!(json["report_metadata"]["total_tests"], 1);
        assert_eq!(
            json["report_metadata"]["alb_dns"],
            "alb-123.us-east-1.elb.amazonaws.com"
        );
        assert_eq!(json["test_results"][0]["test_type"], "scale_down");
        assert_eq!(json["test_results"][0]["success"], false);
        assert_eq!(json["summary"]["failed_tests"], 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_dns_skips_discovery() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");
        let path_arg = path.display().to_string();
        let cli = cli(&[
            "--test-type",
            "scale-down",
            "--duration",
            "30",
            "--alb-dns",
            "given.example.com",
            "--report-file",
            &path_arg,
        ]);

        execute(&cli, Arc::new(SteadyGroup(2)), &Directory::Broken, std::future::pending()).await?;

        assert_eq!(read_json(&path)["report_metadata"]["alb_dns"], "given.example.com");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failed_discovery_still_runs_without_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for directory in [Directory::Missing, Directory::Broken] {
            let path = dir.path().join("report.json");
            let path_arg = path.display().to_string();
            let cli = cli(&[
                "--test-type",
                "stress",
                "--duration",
                "30",
                "--report-file",
                &path_arg,
            ]);

            let code =
                execute(&cli, Arc::new(SteadyGroup(2)), &directory, std::future::pending()).await?;

            assert_eq!(code, ExitCode::Success);
            let json = read_json(&path);
            assert!(json["report_metadata"]["alb_dns"].is_null());
            assert_eq!(json["test_results"][0]["max_capacity_reached"], 2);
        }
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_before_any_result_exits_1() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");
        let path_arg = path.display().to_string();
        let cli = cli(&["--test-type", "all", "--report-file", &path_arg]);

        let code = execute(
            &cli,
            Arc::new(SteadyGroup(2)),
            &Directory::Missing,
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await?;

        assert_eq!(code, ExitCode::Failure);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_report_directory_is_invalid_input() {
        let cli = cli(&["--report-file", "/nonexistent-scalewatch-dir/report.json"]);

        let res = execute(
            &cli,
            Arc::new(SteadyGroup(2)),
            &Directory::Missing,
            std::future::pending(),
        )
        .await;

        match res {
            Err(err) => assert_eq!(err.exit_code(), ExitCode::InvalidInput),
            Ok(code) => panic!("expected invalid input, got {code:?}"),
        }
    }
}
