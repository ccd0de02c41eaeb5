//! Docker CLI container runtime

use super::{ContainerRuntime, ContainerStatus, DockerHost, RunSpec};
use crate::error::{FlowError, Phase, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Container runtime that shells out to the `docker` binary
#[derive(Debug, Clone, Default)]
pub struct DockerCli {
    host: DockerHost,
}

impl DockerCli {
    pub const BINARY: &'static str = "docker";

    pub fn new(host: DockerHost) -> Self {
        Self { host }
    }

    fn command(&self, args: &[String]) -> (Command, String) {
        let command_line = format!("{} {}", Self::BINARY, args.join(" "));
        tracing::debug!("Running: {}", command_line);

        let mut cmd = Command::new(Self::BINARY);
        cmd.args(args).stdin(Stdio::null());
        self.host.apply(&mut cmd);
        (cmd, command_line)
    }

    /// Run a command with inherited output, failing on a non-zero exit
    async fn run_inherited(&self, phase: Phase, args: Vec<String>) -> Result<()> {
        let (mut cmd, command_line) = self.command(&args);
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());

        let status = cmd.status().await.map_err(|e| FlowError::ExternalCommand {
            phase,
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        if !status.success() {
            return Err(FlowError::ExternalCommand {
                phase,
                command: command_line,
                reason: status.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn status(&self, name: &str) -> Result<ContainerStatus> {
        let args: Vec<String> = vec![
            "ps".into(),
            "-a".into(),
            "--filter".into(),
            format!("name={}", name),
            "--format".into(),
            "{{.Status}}".into(),
        ];
        let (mut cmd, command_line) = self.command(&args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| FlowError::ExternalCommand {
            phase: Phase::ProxyStatus,
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FlowError::ExternalCommand {
                phase: Phase::ProxyStatus,
                command: command_line,
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(ContainerStatus::from_ps_output(&stdout))
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.run_inherited(Phase::ProxyStart, vec!["start".into(), name.to_string()])
            .await
    }

    async fn run(&self, spec: &RunSpec) -> Result<()> {
        self.run_inherited(Phase::ProxyRun, spec.args()).await
    }

    async fn exec(&self, name: &str, command: &[&str]) -> Result<()> {
        let mut args = vec!["exec".to_string(), "-i".to_string(), name.to_string()];
        args.extend(command.iter().map(|s| s.to_string()));
        self.run_inherited(Phase::ProxyExec, args).await
    }

    async fn copy_to(&self, source: &Path, name: &str, destination: &str) -> Result<()> {
        let args = vec![
            "cp".to_string(),
            source.to_string_lossy().to_string(),
            format!("{}:{}", name, destination),
        ];
        self.run_inherited(Phase::ProxyCopy, args).await
    }
}
