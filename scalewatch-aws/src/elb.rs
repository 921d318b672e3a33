use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::Client;
use scalewatch_core::cloud::{self, LoadBalancerDirectory};
use tracing::debug;

use crate::backend_error;

/// Looks up application load balancers by name.
#[derive(Debug, Clone)]
pub struct ElbDirectory {
    client: Client,
}

impl ElbDirectory {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl LoadBalancerDirectory for ElbDirectory {
    async fn dns_name(&self, name: &str) -> cloud::Result<Option<String>> {
        let res = match self.client.describe_load_balancers().names(name).send().await {
            Ok(res) => res,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_load_balancer_not_found_exception()) =>
            {
                debug!(name, "load balancer not found");
                return Ok(None);
            }
            Err(err) => return Err(backend_error("elbv2", "DescribeLoadBalancers", err)),
        };

        Ok(res
            .load_balancers()
            .first()
            .and_then(|lb| lb.dns_name())
            .map(str::to_string))
    }
}
