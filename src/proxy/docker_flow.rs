//! Docker Flow Proxy client

use super::template::{self, TemplateKind, TEMPLATES_DIR};
use super::{Proxy, ReconfigureRequest, DEFAULT_RECONFIGURE_PORT, PROXY_CONTAINER, PROXY_IMAGE};
use crate::container::{ContainerRuntime, ContainerStatus, RunSpec};
use crate::discovery::consul::with_scheme;
use crate::error::{FlowError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Reconfiguration endpoint path
pub const RECONFIGURE_PATH: &str = "/v1/docker-flow-proxy/reconfigure";

/// Time given to a freshly started proxy before it is used
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Where the proxy lives and how to reach it
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Address the reconfiguration API is reached at
    pub host: Option<String>,
    /// Docker daemon running the proxy container
    pub docker_host: Option<String>,
    /// Published reconfiguration port
    pub reconf_port: Option<u16>,
    /// State store address handed to the proxy container
    pub consul_address: String,
    /// Wait after starting or creating the container
    pub settle_delay: Duration,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            host: None,
            docker_host: None,
            reconf_port: None,
            consul_address: String::new(),
            settle_delay: SETTLE_DELAY,
        }
    }
}

impl ProxySettings {
    /// Full reconfiguration URL for a request, without validation
    pub fn reconfigure_url(&self, request: &ReconfigureRequest) -> String {
        let host = self.host.as_deref().unwrap_or_default();
        let address = match self.reconf_port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let mut url = format!(
            "{}{}?serviceName={}",
            with_scheme(&address),
            RECONFIGURE_PATH,
            request.service_name
        );
        if request.templates.is_some() {
            url.push_str(&format!(
                "&consulTemplateFePath={}&consulTemplateBePath={}",
                TemplateKind::Frontend.remote_path(&request.service_name),
                TemplateKind::Backend.remote_path(&request.service_name)
            ));
        } else {
            url.push_str(&format!(
                "&serviceColor={}&servicePath={}",
                request.color,
                request.service_paths.join(",")
            ));
        }
        url
    }
}

/// Whether a host string carries an explicit port, ignoring any scheme
fn has_port(host: &str) -> bool {
    let without_scheme = host.split_once("://").map(|(_, rest)| rest).unwrap_or(host);
    without_scheme.contains(':')
}

/// Proxy backed by the `docker-flow-proxy` container
pub struct DockerFlowProxy<R> {
    settings: ProxySettings,
    runtime: R,
    client: reqwest::Client,
}

impl<R: ContainerRuntime> DockerFlowProxy<R> {
    pub fn new(settings: ProxySettings, runtime: R) -> Self {
        Self {
            settings,
            runtime,
            client: reqwest::Client::new(),
        }
    }

    fn run_spec(&self) -> RunSpec {
        let reconf_port = self.settings.reconf_port.unwrap_or(DEFAULT_RECONFIGURE_PORT);
        RunSpec {
            name: PROXY_CONTAINER.to_string(),
            image: PROXY_IMAGE.to_string(),
            env: vec![format!("CONSUL_ADDRESS={}", self.settings.consul_address)],
            publish: vec![
                "80:80".to_string(),
                format!("{}:{}", reconf_port, DEFAULT_RECONFIGURE_PORT),
            ],
        }
    }

    fn validate(&self, request: &ReconfigureRequest) -> Result<()> {
        let host = self.settings.host.as_deref().unwrap_or_default();
        if host.is_empty() {
            return Err(FlowError::Config(
                "proxy host is mandatory for the proxy step, please set the proxy-host argument"
                    .to_string(),
            ));
        }
        if request.service_name.is_empty() {
            return Err(FlowError::Config(
                "service name is mandatory for the proxy step".to_string(),
            ));
        }
        let has_paths = request.service_paths.iter().any(|p| !p.is_empty());
        if !has_paths && request.templates.is_none() {
            return Err(FlowError::Config(
                "service path or consul templates are mandatory for the proxy step".to_string(),
            ));
        }
        if self.settings.reconf_port.is_none() && !has_port(host) {
            return Err(FlowError::Config(
                "reconfigure port is mandatory when the proxy host has no port".to_string(),
            ));
        }
        Ok(())
    }

    /// Materialize both templates and copy them into the proxy container
    async fn upload_templates(&self, request: &ReconfigureRequest) -> Result<()> {
        let Some(templates) = &request.templates else {
            return Ok(());
        };
        let identity = request.identity();

        self.runtime
            .exec(PROXY_CONTAINER, &["mkdir", "-p", TEMPLATES_DIR])
            .await?;

        for (kind, source) in [
            (TemplateKind::Frontend, &templates.frontend),
            (TemplateKind::Backend, &templates.backend),
        ] {
            let local = template::materialize(source, &identity)?;
            let copied = self
                .runtime
                .copy_to(&local, PROXY_CONTAINER, &kind.remote_path(&request.service_name))
                .await;
            if let Err(e) = std::fs::remove_file(&local) {
                tracing::warn!("Could not remove {}: {}", local.display(), e);
            }
            copied?;
        }
        Ok(())
    }

    async fn send_reconfigure(&self, url: &str) -> Result<()> {
        tracing::info!("Sending request to {} to reconfigure the proxy", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FlowError::ProxyReconfiguration {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(FlowError::ProxyReconfiguration {
                url: url.to_string(),
                reason: format!("the response from the proxy was {}", response.status()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<R: ContainerRuntime> Proxy for DockerFlowProxy<R> {
    async fn provision(&self) -> Result<()> {
        if self.settings.docker_host.as_deref().unwrap_or_default().is_empty() {
            return Err(FlowError::Config(
                "proxy docker host is mandatory for the proxy step, please set the proxy-docker-host argument"
                    .to_string(),
            ));
        }
        if self.settings.consul_address.is_empty() {
            return Err(FlowError::Config("consul address is mandatory".to_string()));
        }

        tracing::info!("Checking status of the {} container...", PROXY_CONTAINER);
        match self.runtime.status(PROXY_CONTAINER).await? {
            ContainerStatus::Running => return Ok(()),
            ContainerStatus::Exited => {
                tracing::info!("Starting the {} container...", PROXY_CONTAINER);
                self.runtime.start(PROXY_CONTAINER).await?;
            }
            ContainerStatus::Absent => {
                tracing::info!("Running the {} container...", PROXY_CONTAINER);
                self.runtime.run(&self.run_spec()).await?;
            }
        }

        tokio::time::sleep(self.settings.settle_delay).await;
        Ok(())
    }

    async fn reconfigure(&self, request: &ReconfigureRequest) -> Result<()> {
        self.validate(request)?;
        self.upload_templates(request).await?;
        let url = self.settings.reconfigure_url(request);
        self.send_reconfigure(&url).await
    }
}
