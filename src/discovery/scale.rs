//! Replica count calculation

use super::{StateKey, StateStore};
use crate::error::{FlowError, Result};
use std::fmt;
use std::str::FromStr;

/// Replica count assumed when none is stored
pub const DEFAULT_SCALE: i64 = 1;

/// Requested scale expression
///
/// An empty expression keeps the stored count, a bare number replaces it and
/// a number prefixed with `+` or `-` is added to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleSpec {
    #[default]
    Keep,
    Absolute(i64),
    Relative(i64),
}

impl ScaleSpec {
    /// Combine with a stored replica count. Never yields less than one.
    pub fn apply(&self, stored: i64) -> u32 {
        let total = match *self {
            ScaleSpec::Keep => stored,
            ScaleSpec::Absolute(n) => n,
            ScaleSpec::Relative(delta) => stored.saturating_add(delta),
        };
        if total <= 0 {
            1
        } else {
            u32::try_from(total).unwrap_or(u32::MAX)
        }
    }

    /// Read the stored replica count and apply this expression to it
    pub async fn resolve<S: StateStore + ?Sized>(&self, store: &S, service_name: &str) -> Result<u32> {
        let raw = store.get(service_name, StateKey::Scale).await?;
        let stored = match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => value.parse::<i64>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Stored scale '{}' for {} is not a number, assuming {}",
                    value,
                    service_name,
                    DEFAULT_SCALE
                );
                DEFAULT_SCALE
            }),
            None => DEFAULT_SCALE,
        };
        Ok(self.apply(stored))
    }
}

impl FromStr for ScaleSpec {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(ScaleSpec::Keep);
        }
        let invalid = || FlowError::Config("scale must be a number or empty".to_string());
        if s.starts_with('+') || s.starts_with('-') {
            s.parse::<i64>().map(ScaleSpec::Relative).map_err(|_| invalid())
        } else {
            s.parse::<i64>().map(ScaleSpec::Absolute).map_err(|_| invalid())
        }
    }
}

impl fmt::Display for ScaleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleSpec::Keep => Ok(()),
            ScaleSpec::Absolute(n) => write!(f, "{}", n),
            ScaleSpec::Relative(delta) => write!(f, "{:+}", delta),
        }
    }
}
