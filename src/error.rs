//! Error types for Docker Flow

use crate::flow::FlowStep;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Docker Flow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// External command phase that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pull,
    Up,
    Rm,
    Scale,
    Stop,
    ProxyStatus,
    ProxyStart,
    ProxyRun,
    ProxyExec,
    ProxyCopy,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pull => "pull",
            Phase::Up => "up",
            Phase::Rm => "rm",
            Phase::Scale => "scale",
            Phase::Stop => "stop",
            Phase::ProxyStatus => "proxy ps",
            Phase::ProxyStart => "proxy start",
            Phase::ProxyRun => "proxy run",
            Phase::ProxyExec => "proxy exec",
            Phase::ProxyCopy => "proxy cp",
        };
        f.write_str(name)
    }
}

/// Docker Flow error types
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not read the Docker Compose file {}: {source}", path.display())]
    ComposeFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write the Docker Flow file {}: {source}", path.display())]
    ComposeFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not remove the Docker Flow file {}: {source}", path.display())]
    ComposeFileRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not process the template file {}: {source}", path.display())]
    TemplateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The {phase} command failed: {command}: {reason}")]
    ExternalCommand {
        phase: Phase,
        command: String,
        reason: String,
    },

    #[error("State store request to {url} failed: {reason}")]
    StateStore { url: String, reason: String },

    #[error("Proxy reconfiguration request to {url} failed: {reason}")]
    ProxyReconfiguration { url: String, reason: String },

    #[error("The {step} step failed: {source}")]
    Step {
        step: FlowStep,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Wrap an error with the flow step it aborted
    pub fn in_step(self, step: FlowStep) -> Self {
        FlowError::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The innermost error, with every step wrapper removed
    pub fn root_cause(&self) -> &FlowError {
        match self {
            FlowError::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
