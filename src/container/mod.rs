//! Container runtime access
//!
//! The proxy container is managed directly through the Docker CLI. This
//! module provides the runtime seam, container status parsing and the
//! daemon addressing shared with the compose runner.

pub mod docker;

pub use docker::DockerCli;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Docker daemon a command is sent to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerHost {
    /// Value for `DOCKER_HOST`
    pub host: Option<String>,
    /// Value for `DOCKER_CERT_PATH`
    pub cert_path: Option<String>,
}

impl DockerHost {
    pub fn new(host: Option<String>, cert_path: Option<String>) -> Self {
        Self {
            host: host.filter(|h| !h.is_empty()),
            cert_path: cert_path.filter(|c| !c.is_empty()),
        }
    }

    /// Environment for a child process. Unset values leave the inherited
    /// environment untouched.
    pub fn apply(&self, cmd: &mut Command) {
        if let Some(host) = &self.host {
            cmd.env("DOCKER_HOST", host);
        }
        if let Some(path) = &self.cert_path {
            cmd.env("DOCKER_CERT_PATH", path);
        }
    }
}

/// Container status as reported by `docker ps -a`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Exited,
    Absent,
}

impl ContainerStatus {
    /// Interpret the `{{.Status}}` column of `docker ps`
    pub fn from_ps_output(output: &str) -> Self {
        let status = output.trim();
        if status.starts_with("Exited") {
            ContainerStatus::Exited
        } else if status.is_empty() {
            ContainerStatus::Absent
        } else {
            ContainerStatus::Running
        }
    }
}

/// Options for starting a new detached container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    /// `KEY=VALUE` pairs
    pub env: Vec<String>,
    /// `host:container` port mappings
    pub publish: Vec<String>,
}

impl RunSpec {
    /// Arguments for `docker run`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.name.clone(),
        ];
        for env in &self.env {
            args.push("-e".to_string());
            args.push(env.clone());
        }
        for port in &self.publish {
            args.push("-p".to_string());
            args.push(port.clone());
        }
        args.push(self.image.clone());
        args
    }
}

/// Operations on named containers
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Status of the container with the given name
    async fn status(&self, name: &str) -> Result<ContainerStatus>;

    /// Start an existing, stopped container
    async fn start(&self, name: &str) -> Result<()>;

    /// Create and start a new detached container
    async fn run(&self, spec: &RunSpec) -> Result<()>;

    /// Execute a command inside a running container
    async fn exec(&self, name: &str, command: &[&str]) -> Result<()>;

    /// Copy a local file into a container (`<name>:<path>`)
    async fn copy_to(&self, source: &Path, name: &str, destination: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_ps_output() {
        assert_eq!(
            ContainerStatus::from_ps_output("Exited (2) 15 seconds ago\n"),
            ContainerStatus::Exited
        );
        assert_eq!(ContainerStatus::from_ps_output(""), ContainerStatus::Absent);
        assert_eq!(ContainerStatus::from_ps_output("\n"), ContainerStatus::Absent);
        assert_eq!(
            ContainerStatus::from_ps_output("Up 3 hours"),
            ContainerStatus::Running
        );
        assert_eq!(
            ContainerStatus::from_ps_output("Created"),
            ContainerStatus::Running
        );
    }

    #[test]
    fn test_run_spec_args() {
        let spec = RunSpec {
            name: "docker-flow-proxy".to_string(),
            image: "vfarcic/docker-flow-proxy".to_string(),
            env: vec!["CONSUL_ADDRESS=1.2.3.4:8500".to_string()],
            publish: vec!["80:80".to_string(), "8081:8080".to_string()],
        };

        assert_eq!(
            spec.args().join(" "),
            "run -d --name docker-flow-proxy -e CONSUL_ADDRESS=1.2.3.4:8500 \
             -p 80:80 -p 8081:8080 vfarcic/docker-flow-proxy"
        );
    }

    #[test]
    fn test_docker_host_drops_empty_values() {
        let host = DockerHost::new(Some(String::new()), Some("/certs".to_string()));

        assert_eq!(host.host, None);
        assert_eq!(host.cert_path.as_deref(), Some("/certs"));
    }

    #[test]
    fn test_docker_host_sets_child_env() {
        let host = DockerHost::new(Some("tcp://swarm:2376".to_string()), None);
        let mut cmd = Command::new("docker");

        host.apply(&mut cmd);

        let envs: Vec<_> = cmd.as_std().get_envs().collect();
        assert_eq!(
            envs,
            vec![(
                std::ffi::OsStr::new("DOCKER_HOST"),
                Some(std::ffi::OsStr::new("tcp://swarm:2376"))
            )]
        );
    }
}
