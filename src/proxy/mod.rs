//! Reverse proxy provisioning and reconfiguration
//!
//! After a deployment the proxy has to learn which color of a service to
//! route to. The proxy runs as the `docker-flow-proxy` container and is
//! reconfigured through its HTTP API.

pub mod docker_flow;
pub mod template;

pub use docker_flow::{DockerFlowProxy, ProxySettings};
pub use template::TemplatePaths;

use crate::discovery::Color;
use crate::error::Result;
use async_trait::async_trait;

/// Name of the proxy container
pub const PROXY_CONTAINER: &str = "docker-flow-proxy";

/// Image the proxy container is created from
pub const PROXY_IMAGE: &str = "vfarcic/docker-flow-proxy";

/// Port the proxy listens on for reconfiguration requests inside its container
pub const DEFAULT_RECONFIGURE_PORT: u16 = 8080;

/// What the proxy should route for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconfigureRequest {
    pub service_name: String,
    /// Color of the copy that should receive traffic. Plain deployments
    /// carry one as well, matching the `SERVICE_NAME` their overlay publishes.
    pub color: Color,
    /// Routable paths
    pub service_paths: Vec<String>,
    /// Consul templates used instead of paths
    pub templates: Option<TemplatePaths>,
}

impl ReconfigureRequest {
    /// Identity the proxy addresses, e.g. `shop-app-blue`
    pub fn identity(&self) -> String {
        format!("{}-{}", self.service_name, self.color)
    }
}

/// Proxy operations used by the deployment flow
#[async_trait]
pub trait Proxy: Send + Sync {
    /// Make sure the proxy is running
    async fn provision(&self) -> Result<()>;

    /// Point the proxy at a service
    async fn reconfigure(&self, request: &ReconfigureRequest) -> Result<()>;
}
