//! AWS implementations of the `scalewatch_core::cloud` traits.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_cloudwatch::error::BuildError;
use scalewatch_core::cloud;

mod autoscaling;
mod cloudwatch;
mod elb;

pub use autoscaling::AutoScalingControlPlane;
pub use cloudwatch::{CloudWatchSink, GROUP_CPU_NAMESPACE};
pub use elb::ElbDirectory;

/// Shared SDK configuration: default credential chain, explicit region.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}

/// Smithy builders hand back the shape itself when it has no required
/// members and `Result<_, BuildError>` when it does.
trait BuildOutput<T> {
    fn into_built(self) -> Result<T, BuildError>;
}

impl<T> BuildOutput<T> for T {
    fn into_built(self) -> Result<T, BuildError> {
        Ok(self)
    }
}

impl<T> BuildOutput<T> for Result<T, BuildError> {
    fn into_built(self) -> Result<T, BuildError> {
        self
    }
}

fn built<T>(output: impl BuildOutput<T>) -> cloud::Result<T> {
    output
        .into_built()
        .map_err(|err| cloud::Error::InvalidRequest(err.to_string()))
}

fn backend_error<E>(service: &'static str, operation: &'static str, err: E) -> cloud::Error
where
    E: std::error::Error,
{
    cloud::Error::backend(
        service,
        operation,
        aws_sdk_cloudwatch::error::DisplayErrorContext(err).to_string(),
    )
}

fn to_chrono(dt: &aws_sdk_cloudwatch::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
