//! Docker Compose command runner

use crate::container::DockerHost;
use crate::error::{FlowError, Phase, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Compose operations used by the deployment flow
///
/// Implementors only provide [`ComposeRunner::run`]; the sub-commands are
/// built here. Operations on an empty target list do nothing.
#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// Execute a compose sub-command such as `["up", "-d", "app-blue"]`
    async fn run(&self, phase: Phase, args: Vec<String>) -> Result<()>;

    /// Pull images for targets
    async fn pull(&self, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        self.run(Phase::Pull, with_targets(&["pull"], targets)).await
    }

    /// Create and start targets in the background
    async fn up(&self, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        self.run(Phase::Up, with_targets(&["up", "-d"], targets)).await
    }

    /// Force-remove stopped containers of targets
    async fn rm(&self, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        self.run(Phase::Rm, with_targets(&["rm", "-f"], targets)).await
    }

    /// Set the number of containers of a target
    async fn scale(&self, target: &str, scale: u32) -> Result<()> {
        if target.is_empty() {
            return Ok(());
        }
        let args = vec!["scale".to_string(), format!("{}={}", target, scale)];
        self.run(Phase::Scale, args).await
    }

    /// Stop targets without removing them
    async fn stop(&self, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        self.run(Phase::Stop, with_targets(&["stop"], targets)).await
    }
}

fn with_targets(command: &[&str], targets: &[String]) -> Vec<String> {
    command
        .iter()
        .map(|s| s.to_string())
        .chain(targets.iter().cloned())
        .collect()
}

/// Runs the `docker-compose` binary against the flow overlay
#[derive(Debug, Clone)]
pub struct DockerCompose {
    /// Compose file every command is scoped to
    overlay_path: PathBuf,
    /// Compose project name
    project: Option<String>,
    /// Docker daemon to talk to
    host: DockerHost,
}

impl DockerCompose {
    pub const BINARY: &'static str = "docker-compose";

    pub fn new(overlay_path: impl Into<PathBuf>, project: Option<String>, host: DockerHost) -> Self {
        Self {
            overlay_path: overlay_path.into(),
            project: project.filter(|p| !p.is_empty()),
            host,
        }
    }

    /// Full argument list: `-f <overlay> [-p <project>] <args...>`
    pub fn command_args(&self, args: &[String]) -> Vec<String> {
        let mut full = vec![
            "-f".to_string(),
            self.overlay_path.to_string_lossy().to_string(),
        ];
        if let Some(project) = &self.project {
            full.push("-p".to_string());
            full.push(project.clone());
        }
        full.extend(args.iter().cloned());
        full
    }
}

#[async_trait]
impl ComposeRunner for DockerCompose {
    async fn run(&self, phase: Phase, args: Vec<String>) -> Result<()> {
        let full = self.command_args(&args);
        let command_line = format!("{} {}", Self::BINARY, full.join(" "));
        tracing::debug!("Running: {}", command_line);

        let mut cmd = Command::new(Self::BINARY);
        cmd.args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        self.host.apply(&mut cmd);

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


#[cfg(test)]
mod tests {
    use super::recording::RecordingCompose;
    use super::*;

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_sub_commands() {
        let runner = RecordingCompose::default();

        runner.pull(&targets(&["app-blue", "db"])).await.unwrap();
        runner.up(&targets(&["db", "app-blue"])).await.unwrap();
        runner.rm(&targets(&["app-blue"])).await.unwrap();
        runner.scale("app-blue", 3).await.unwrap();
        runner.stop(&targets(&["app-green"])).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                (Phase::Pull, targets(&["pull", "app-blue", "db"])),
                (Phase::Up, targets(&["up", "-d", "db", "app-blue"])),
                (Phase::Rm, targets(&["rm", "-f", "app-blue"])),
                (Phase::Scale, targets(&["scale", "app-blue=3"])),
                (Phase::Stop, targets(&["stop", "app-green"])),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_targets_are_noops() {
        let runner = RecordingCompose::default();

        runner.pull(&[]).await.unwrap();
        runner.up(&[]).await.unwrap();
        runner.rm(&[]).await.unwrap();
        runner.scale("", 2).await.unwrap();
        runner.stop(&[]).await.unwrap();

        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_command_args_scope_overlay_and_project() {
        let compose = DockerCompose::new(
            "docker-compose-flow.yml.tmp",
            Some("shop".to_string()),
            DockerHost::default(),
        );

        assert_eq!(
            compose.command_args(&targets(&["stop", "app-green"])),
            targets(&["-f", "docker-compose-flow.yml.tmp", "-p", "shop", "stop", "app-green"])
        );
    }

    #[test]
    fn test_command_args_without_project() {
        let compose = DockerCompose::new("flow.yml", Some(String::new()), DockerHost::default());

        assert_eq!(
            compose.command_args(&targets(&["pull", "app"])),
            targets(&["-f", "flow.yml", "pull", "app"])
        );
    }

    #[tokio::test]
    async fn test_docker_compose_skips_empty_targets_without_spawning() {
        let compose = DockerCompose::new("flow.yml", None, DockerHost::default());

        compose.rm(&[]).await.unwrap();
    }
}
