//! Docker Compose integration
//!
//! This module generates the flow overlay that renames services per color
//! and drives `docker-compose` against it.

pub mod overlay;
pub mod runner;

pub use overlay::{OverlayFile, OverlaySpec, DEFAULT_OVERLAY_PATH};
pub use runner::{ComposeRunner, DockerCompose};
