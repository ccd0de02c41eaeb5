//! Docker Flow - blue-green redeployment of Docker Compose services
//!
//! A flow run executes an ordered list of steps against one compose
//! service:
//!
//! - `deploy` brings up the next color of the service next to the current one
//! - `scale` changes the replica count of the running color
//! - `stop-old` stops the color that no longer receives traffic
//! - `proxy` points the `docker-flow-proxy` container at the new color
//!
//! The current color and scale of every service live in Consul.

pub mod compose;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod flow;
pub mod proxy;

#[cfg(test)]
mod testing;

pub use error::{FlowError, Result};
