//! Deployment flow
//!
//! A run executes an ordered list of steps against the compose runner, the
//! state store and the proxy. The orchestrator resolves colors once and
//! threads a [`RunContext`] through the steps.

pub mod orchestrator;
pub mod target;

pub use orchestrator::{FlowOrchestrator, FlowSettings};
pub use target::DeploymentTarget;

use crate::discovery::ColorState;
use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A step of a deployment flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStep {
    /// Pull, recreate and scale the next color
    Deploy,
    /// Change the replica count of the running color
    Scale,
    /// Stop the color that is no longer served
    StopOld,
    /// Provision and reconfigure the proxy
    Proxy,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Deploy => "deploy",
            FlowStep::Scale => "scale",
            FlowStep::StopOld => "stop-old",
            FlowStep::Proxy => "proxy",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowStep {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "deploy" => Ok(FlowStep::Deploy),
            "scale" => Ok(FlowStep::Scale),
            "stop-old" => Ok(FlowStep::StopOld),
            "proxy" => Ok(FlowStep::Proxy),
            other => Err(FlowError::Config(format!(
                "unknown flow step '{}', expected one of deploy, scale, stop-old, proxy",
                other
            ))),
        }
    }
}

/// State carried from one step to the next within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// Colors resolved at the start of the run
    pub colors: ColorState,
    /// Whether the deploy step is part of this run
    pub deploy_requested: bool,
    /// Whether the deploy step has already completed in this run
    pub deployed: bool,
}

impl RunContext {
    pub fn new(colors: ColorState, steps: &[FlowStep]) -> Self {
        Self {
            colors,
            deploy_requested: steps.contains(&FlowStep::Deploy),
            deployed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Color;

    #[test]
    fn test_parse_steps() {
        assert_eq!("deploy".parse::<FlowStep>().unwrap(), FlowStep::Deploy);
        assert_eq!("stop-old".parse::<FlowStep>().unwrap(), FlowStep::StopOld);
        assert!(matches!(
            "stop_old".parse::<FlowStep>(),
            Err(FlowError::Config(_))
        ));
    }

    #[test]
    fn test_display_matches_parse() {
        for step in [FlowStep::Deploy, FlowStep::Scale, FlowStep::StopOld, FlowStep::Proxy] {
            assert_eq!(step.to_string().parse::<FlowStep>().unwrap(), step);
        }
    }

    #[test]
    fn test_yaml_names() {
        let steps: Vec<FlowStep> = serde_yaml::from_str("[deploy, stop-old, proxy]").unwrap();
        assert_eq!(steps, vec![FlowStep::Deploy, FlowStep::StopOld, FlowStep::Proxy]);
    }

    #[test]
    fn test_run_context_tracks_requested_deploy() {
        let colors = ColorState::from_current(Color::Green, false);

        assert!(RunContext::new(colors, &[FlowStep::Scale, FlowStep::Deploy]).deploy_requested);
        assert!(!RunContext::new(colors, &[FlowStep::Proxy]).deploy_requested);
        assert!(!RunContext::new(colors, &[FlowStep::Deploy]).deployed);
    }
}
