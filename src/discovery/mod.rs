//! Service discovery state
//!
//! Each service keeps its current deployment color and replica count in a
//! key/value store under `docker-flow/<service>/<key>`. This module provides
//! the store seam, the Consul implementation and the color/scale
//! resolution built on top of it.

pub mod color;
pub mod consul;
pub mod scale;

pub use color::{Color, ColorState};
pub use consul::ConsulStore;
pub use scale::ScaleSpec;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Key prefix shared by every service entry
pub const KEY_PREFIX: &str = "docker-flow";

/// Per-service state entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Color,
    Scale,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Color => "color",
            StateKey::Scale => "scale",
        }
    }

    /// Full key path for a service, e.g. `docker-flow/app/color`
    pub fn path(&self, service_name: &str) -> String {
        format!("{}/{}/{}", KEY_PREFIX, service_name, self.as_str())
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value store holding per-service deployment state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a raw value. Absent keys yield `None`.
    async fn get(&self, service_name: &str, key: StateKey) -> Result<Option<String>>;

    /// Store a raw value
    async fn put(&self, service_name: &str, key: StateKey, value: &str) -> Result<()>;
}

/// Persist the deployed color of a service
pub async fn put_color<S: StateStore + ?Sized>(
    store: &S,
    service_name: &str,
    color: Color,
) -> Result<()> {
    tracing::debug!("Storing color {} for {}", color, service_name);
    store.put(service_name, StateKey::Color, color.as_str()).await
}

/// Persist the replica count of a service
pub async fn put_scale<S: StateStore + ?Sized>(
    store: &S,
    service_name: &str,
    scale: u32,
) -> Result<()> {
    tracing::debug!("Storing scale {} for {}", scale, service_name);
    store
        .put(service_name, StateKey::Scale, &scale.to_string())
        .await
}
