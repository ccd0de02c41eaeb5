//! Flow configuration
//!
//! Settings come from three layers. The optional `docker-flow.yml` file in
//! the working directory is read first, `FLOW_*` environment variables and
//! command-line flags override it. Switches are enabled if any layer
//! enables them.

pub mod file;

pub use file::FileConfig;

use crate::container::DockerHost;
use crate::discovery::ScaleSpec;
use crate::error::{FlowError, Result};
use crate::flow::{DeploymentTarget, FlowSettings, FlowStep};
use crate::proxy::{ProxySettings, TemplatePaths};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};

/// Default flow file name
pub const DEFAULT_FLOW_FILE: &str = "docker-flow.yml";

/// Default base compose file
pub const DEFAULT_COMPOSE_PATH: &str = "docker-compose.yml";

/// Command-line and environment layer
#[derive(Args, Debug, Clone, Default)]
pub struct FlowArgs {
    /// Docker daemon compose talks to
    #[arg(short = 'H', long, env = "FLOW_HOST")]
    pub host: Option<String>,

    /// Docker certificate path
    #[arg(long, env = "FLOW_CERT_PATH")]
    pub cert_path: Option<String>,

    /// Docker Compose configuration file
    #[arg(short = 'f', long, env = "FLOW_COMPOSE_PATH")]
    pub compose_path: Option<PathBuf>,

    /// Perform a blue-green deployment
    #[arg(
        short = 'b',
        long,
        env = "FLOW_BLUE_GREEN",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub blue_green: bool,

    /// Docker Compose target to deploy
    #[arg(short = 't', long, env = "FLOW_TARGET")]
    pub target: Option<String>,

    /// Side or auxiliary targets deployed with the target
    #[arg(short = 'T', long = "side-target", env = "FLOW_SIDE_TARGETS", value_delimiter = ',')]
    pub side_targets: Vec<String>,

    /// Do not pull the target image
    #[arg(
        short = 'P',
        long = "skip-pull-targets",
        env = "FLOW_SKIP_PULL_TARGET",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub skip_pull_target: bool,

    /// Pull the side target images
    #[arg(
        short = 'S',
        long,
        env = "FLOW_PULL_SIDE_TARGETS",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub pull_side_targets: bool,

    /// Docker Compose project, defaults to the current directory name
    #[arg(short = 'p', long, env = "FLOW_PROJECT")]
    pub project: Option<String>,

    /// Consul address
    #[arg(short = 'c', long, env = "FLOW_CONSUL_ADDRESS")]
    pub consul_address: Option<String>,

    /// Number of instances, `+n` and `-n` change the current count
    #[arg(short = 's', long, env = "FLOW_SCALE", allow_hyphen_values = true)]
    pub scale: Option<String>,

    /// Steps to run, in order
    #[arg(short = 'F', long, env = "FLOW_FLOW", value_enum, value_delimiter = ',')]
    pub flow: Vec<FlowStep>,

    /// Paths the proxy routes to the service
    #[arg(long = "service-path", env = "FLOW_SERVICE_PATH", value_delimiter = ',')]
    pub service_path: Vec<String>,

    /// Address of the proxy reconfiguration API
    #[arg(long, env = "FLOW_PROXY_HOST")]
    pub proxy_host: Option<String>,

    /// Docker daemon running the proxy container
    #[arg(long, env = "FLOW_PROXY_DOCKER_HOST")]
    pub proxy_docker_host: Option<String>,

    /// Docker certificate path for the proxy daemon
    #[arg(long, env = "FLOW_PROXY_DOCKER_CERT_PATH")]
    pub proxy_docker_cert_path: Option<String>,

    /// Port of the proxy reconfiguration API
    #[arg(long, env = "FLOW_PROXY_RECONF_PORT")]
    pub proxy_reconf_port: Option<u16>,

    /// Consul template for the proxy frontend
    #[arg(long, env = "FLOW_CONSUL_TEMPLATE_FE_PATH")]
    pub consul_template_fe_path: Option<PathBuf>,

    /// Consul template for the proxy backend
    #[arg(long, env = "FLOW_CONSUL_TEMPLATE_BE_PATH")]
    pub consul_template_be_path: Option<PathBuf>,

    /// Service name, defaults to `<project>-<target>`
    #[arg(long, env = "FLOW_SERVICE_NAME")]
    pub service_name: Option<String>,

    /// Flow file read before the other layers
    #[arg(long, env = "FLOW_FILE", default_value = DEFAULT_FLOW_FILE)]
    pub flow_file: PathBuf,
}

/// Fully resolved settings of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    pub host: Option<String>,
    pub cert_path: Option<String>,
    pub compose_path: PathBuf,
    pub blue_green: bool,
    pub target: String,
    pub side_targets: Vec<String>,
    pub skip_pull_target: bool,
    pub pull_side_targets: bool,
    pub project: String,
    pub consul_address: String,
    pub scale: ScaleSpec,
    pub flow: Vec<FlowStep>,
    pub service_paths: Vec<String>,
    pub proxy_host: Option<String>,
    pub proxy_docker_host: Option<String>,
    pub proxy_docker_cert_path: Option<String>,
    pub proxy_reconf_port: Option<u16>,
    pub templates: Option<TemplatePaths>,
    pub service_name: String,
}

impl FlowConfig {
    /// Read the flow file next to `working_dir` and merge it with `args`
    pub fn load(args: FlowArgs, working_dir: &Path) -> Result<Self> {
        let file = FileConfig::load(&working_dir.join(&args.flow_file))?;
        Self::resolve(args, file, working_dir)
    }

    /// Merge the layers and validate the result
    pub fn resolve(args: FlowArgs, file: FileConfig, working_dir: &Path) -> Result<Self> {
        let target = non_empty(args.target.or(file.target))
            .ok_or_else(|| FlowError::Config("target argument is required".to_string()))?;
        let consul_address = non_empty(args.consul_address.or(file.consul_address))
            .ok_or_else(|| FlowError::Config("consul-address argument is required".to_string()))?;

        let scale = match args.scale.or(file.scale) {
            Some(raw) => raw.parse()?,
            None => ScaleSpec::Keep,
        };

        let project = non_empty(args.project.or(file.project)).unwrap_or_else(|| {
            working_dir
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("default")
                .to_string()
        });
        let service_name = non_empty(args.service_name.or(file.service_name))
            .unwrap_or_else(|| format!("{}-{}", project, target));

        let flow = prefer(args.flow, file.flow);
        let flow = if flow.is_empty() {
            vec![FlowStep::Deploy]
        } else {
            flow
        };

        let templates = match (
            args.consul_template_fe_path.or(file.consul_template_fe_path),
            args.consul_template_be_path.or(file.consul_template_be_path),
        ) {
            (Some(frontend), Some(backend)) => Some(TemplatePaths { frontend, backend }),
            (None, None) => None,
            _ => {
                return Err(FlowError::Config(
                    "consul-template-fe-path and consul-template-be-path must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            host: non_empty(args.host.or(file.host)),
            cert_path: non_empty(args.cert_path.or(file.cert_path)),
            compose_path: args
                .compose_path
                .or(file.compose_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPOSE_PATH)),
            blue_green: args.blue_green || file.blue_green,
            target,
            side_targets: cleaned(prefer(args.side_targets, file.side_targets)),
            skip_pull_target: args.skip_pull_target || file.skip_pull_target,
            pull_side_targets: args.pull_side_targets || file.pull_side_targets,
            project,
            consul_address,
            scale,
            flow,
            service_paths: cleaned(prefer(args.service_path, file.service_path)),
            proxy_host: non_empty(args.proxy_host.or(file.proxy_host)),
            proxy_docker_host: non_empty(args.proxy_docker_host.or(file.proxy_docker_host)),
            proxy_docker_cert_path: non_empty(
                args.proxy_docker_cert_path.or(file.proxy_docker_cert_path),
            ),
            proxy_reconf_port: args.proxy_reconf_port.or(file.proxy_reconf_port),
            templates,
            service_name,
        })
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            service_name: self.service_name.clone(),
            target: DeploymentTarget::new(
                self.target.clone(),
                self.side_targets.clone(),
                self.blue_green,
            ),
            compose_path: self.compose_path.clone(),
            scale: self.scale,
            skip_pull_target: self.skip_pull_target,
            pull_side_targets: self.pull_side_targets,
            service_paths: self.service_paths.clone(),
            templates: self.templates.clone(),
        }
    }

    pub fn proxy_settings(&self) -> ProxySettings {
        ProxySettings {
            host: self.proxy_host.clone(),
            docker_host: self.proxy_docker_host.clone(),
            reconf_port: self.proxy_reconf_port,
            consul_address: self.consul_address.clone(),
            ..Default::default()
        }
    }

    /// Daemon the compose commands run against
    pub fn compose_host(&self) -> DockerHost {
        DockerHost::new(self.host.clone(), self.cert_path.clone())
    }

    /// Daemon the proxy container runs on
    pub fn proxy_docker(&self) -> DockerHost {
        DockerHost::new(
            self.proxy_docker_host.clone(),
            self.proxy_docker_cert_path.clone(),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Later layer wins when it has any entries
fn prefer<T>(over: Vec<T>, base: Vec<T>) -> Vec<T> {
    if over.is_empty() {
        base
    } else {
        over
    }
}

fn cleaned(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
