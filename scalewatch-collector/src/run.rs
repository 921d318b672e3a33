use std::sync::Arc;

use scalewatch_aws::{CloudWatchSink, load_sdk_config};
use scalewatch_core::cloud::MetricsSink;
use scalewatch_core::metrics::{LogSink, resolve_instance_id, run_continuous};
use scalewatch_core::{CollectorConfig, HttpClient, MetricsCollector};
use tracing::info;

use crate::cli::Cli;
use crate::exit_codes::ExitCode;

fn collector_config(cli: &Cli) -> CollectorConfig {
    CollectorConfig {
        namespace: cli.namespace.clone(),
        health_url: cli.health_url.clone(),
        batch_size: cli.batch_size,
        interval: cli.interval,
        ..CollectorConfig::default()
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let sink: Arc<dyn MetricsSink> = if cli.dry_run {
        info!("dry run: metrics are logged, not published");
        Arc::new(LogSink)
    } else {
        let sdk = load_sdk_config(&cli.region).await;
        Arc::new(CloudWatchSink::new(&sdk))
    };

    let instance_id = resolve_instance_id(&HttpClient::default(), &cli.metadata_url).await;
    info!(instance_id = %instance_id, region = %cli.region, "metrics collector initialized");

    let collector = MetricsCollector::new(collector_config(&cli), instance_id, sink);

    if cli.continuous {
        run_continuous(Arc::new(collector), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
        return Ok(ExitCode::Success);
    }

    Ok(ExitCode::from_published(
        collector.collect_and_publish_all().await,
    ))
}
