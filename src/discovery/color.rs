//! Deployment color resolution

use super::{StateKey, StateStore};
use crate::error::{FlowError, Result};
use std::fmt;
use std::str::FromStr;

/// Alternating identity of the two copies of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Blue,
    Green,
}

impl Color {
    /// The color a deployment switches to from `self`
    pub fn next(self) -> Color {
        match self {
            Color::Blue => Color::Green,
            Color::Green => Color::Blue,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "blue" => Ok(Color::Blue),
            "green" => Ok(Color::Green),
            other => Err(FlowError::Config(format!("unknown color '{}'", other))),
        }
    }
}

/// Colors resolved once at the start of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorState {
    /// Color currently serving traffic
    pub current: Color,
    /// Color the next deployment goes to
    pub next: Color,
    /// Whether a color had been stored before this run
    pub stored: bool,
}

impl ColorState {
    pub fn from_current(current: Color, stored: bool) -> Self {
        Self {
            current,
            next: current.next(),
            stored,
        }
    }

    /// Read the stored color of a service. Nothing stored means green is
    /// current, so the first deployment goes out blue.
    pub async fn resolve<S: StateStore + ?Sized>(store: &S, service_name: &str) -> Result<Self> {
        let raw = store.get(service_name, StateKey::Color).await?;

        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => {
                let current = value.parse::<Color>().map_err(|_| FlowError::StateStore {
                    url: StateKey::Color.path(service_name),
                    reason: format!("stored color '{}' is neither blue nor green", value),
                })?;
                Ok(Self::from_current(current, true))
            }
            None => Ok(Self::from_current(Color::Green, false)),
        }
    }
}
