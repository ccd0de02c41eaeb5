//! Deployment flow orchestrator

use super::{DeploymentTarget, FlowStep, RunContext};
use crate::compose::{ComposeRunner, OverlayFile, OverlaySpec};
use crate::discovery::{self, Color, ColorState, ScaleSpec, StateStore};
use crate::error::Result;
use crate::proxy::{Proxy, ReconfigureRequest, TemplatePaths};
use std::path::PathBuf;

/// Per-service settings of a flow run
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Identity the service is stored and routed under
    pub service_name: String,
    /// Services to deploy
    pub target: DeploymentTarget,
    /// Base compose file the overlay extends
    pub compose_path: PathBuf,
    /// Requested replica count
    pub scale: ScaleSpec,
    /// Do not pull the primary target
    pub skip_pull_target: bool,
    /// Also pull side targets
    pub pull_side_targets: bool,
    /// Routable paths handed to the proxy
    pub service_paths: Vec<String>,
    /// Consul templates handed to the proxy instead of paths
    pub templates: Option<TemplatePaths>,
}

/// Drives a flow's steps against the compose runner, state store and proxy
pub struct FlowOrchestrator<C, S, P> {
    settings: FlowSettings,
    overlay: OverlayFile,
    compose: C,
    store: S,
    proxy: P,
}

impl<C, S, P> FlowOrchestrator<C, S, P>
where
    C: ComposeRunner,
    S: StateStore,
    P: Proxy,
{
    pub fn new(settings: FlowSettings, overlay: OverlayFile, compose: C, store: S, proxy: P) -> Self {
        Self {
            settings,
            overlay,
            compose,
            store,
            proxy,
        }
    }

    /// Execute `steps` in order, stopping at the first failure
    pub async fn run(&self, steps: &[FlowStep]) -> Result<RunContext> {
        let colors = ColorState::resolve(&self.store, &self.settings.service_name).await?;
        tracing::info!(
            "Current color of {} is {}, next is {}",
            self.settings.service_name,
            colors.current,
            colors.next
        );

        let mut ctx = RunContext::new(colors, steps);
        for &step in steps {
            let outcome = match step {
                FlowStep::Deploy => self.deploy(&mut ctx).await,
                FlowStep::Scale => self.scale(&ctx).await,
                FlowStep::StopOld => self.stop_old(&ctx).await,
                FlowStep::Proxy => self.reconfigure_proxy(&ctx).await,
            };
            outcome.map_err(|e| e.in_step(step))?;
        }
        Ok(ctx)
    }

    async fn deploy(&self, ctx: &mut RunContext) -> Result<()> {
        tracing::info!("Deploying...");
        let next = ctx.colors.next;

        self.create_overlay(next)?;
        let outcome = self.deploy_next(&ctx.colors).await;
        let removed = self.overlay.remove();
        outcome?;
        removed?;

        ctx.deployed = true;
        Ok(())
    }

    async fn deploy_next(&self, colors: &ColorState) -> Result<()> {
        let target = &self.settings.target;
        let next_target = target.colored(colors.next);

        self.compose.pull(&self.pull_targets(&next_target)).await?;

        if target.blue_green {
            // Nothing of the next color can exist before the first deployment
            let stale = if colors.stored {
                vec![next_target.clone()]
            } else {
                Vec::new()
            };
            self.compose.rm(&stale).await?;
        }

        let mut up_targets = target.side_targets.clone();
        up_targets.push(next_target.clone());
        self.compose.up(&up_targets).await?;

        self.scale_target(&next_target).await?;
        discovery::put_color(&self.store, &self.settings.service_name, colors.next).await
    }

    fn pull_targets(&self, next_target: &str) -> Vec<String> {
        let mut targets = Vec::new();
        if !self.settings.skip_pull_target {
            targets.push(next_target.to_string());
        }
        if self.settings.pull_side_targets {
            targets.extend(self.settings.target.side_targets.iter().cloned());
        }
        targets
    }

    async fn scale_target(&self, target: &str) -> Result<()> {
        let scale = self
            .settings
            .scale
            .resolve(&self.store, &self.settings.service_name)
            .await?;
        tracing::info!("Scaling {} to {}", target, scale);

        self.compose.scale(target, scale).await?;
        discovery::put_scale(&self.store, &self.settings.service_name, scale).await
    }

    async fn scale(&self, ctx: &RunContext) -> Result<()> {
        if ctx.deployed {
            tracing::debug!("Scaling was already done as part of the deployment");
            return Ok(());
        }

        let current = ctx.colors.current;
        self.create_overlay(current)?;
        let outcome = self.scale_target(&self.settings.target.colored(current)).await;
        let removed = self.overlay.remove();
        outcome?;
        removed
    }

    async fn stop_old(&self, ctx: &RunContext) -> Result<()> {
        if !self.settings.target.blue_green {
            tracing::debug!("Nothing to stop without blue-green deployment");
            return Ok(());
        }

        // A standalone stop-old addresses the next color
        let color = if ctx.deployed {
            ctx.colors.current
        } else {
            ctx.colors.next
        };
        let old_target = self.settings.target.colored(color);
        tracing::info!("Stopping old containers of {}...", old_target);

        self.create_overlay(color)?;
        let outcome = self.compose.stop(&[old_target]).await;
        let removed = self.overlay.remove();
        outcome?;
        removed
    }

    async fn reconfigure_proxy(&self, ctx: &RunContext) -> Result<()> {
        tracing::info!("Reconfiguring the proxy...");
        self.proxy.provision().await?;

        let color = if ctx.deploy_requested {
            ctx.colors.next
        } else {
            ctx.colors.current
        };
        let request = ReconfigureRequest {
            service_name: self.settings.service_name.clone(),
            color,
            service_paths: self.settings.service_paths.clone(),
            templates: self.settings.templates.clone(),
        };
        self.proxy.reconfigure(&request).await
    }

    fn create_overlay(&self, color: Color) -> Result<()> {
        let target = &self.settings.target;
        self.overlay.create(
            &self.settings.compose_path,
            &OverlaySpec {
                service_name: &self.settings.service_name,
                target: &target.name,
                side_targets: &target.side_targets,
                color: color.as_str(),
                blue_green: target.blue_green,
            },
        )
    }
}
