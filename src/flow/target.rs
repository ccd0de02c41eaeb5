//! Deployment targets and their color-qualified names

use crate::discovery::Color;

/// Name under which a target runs for a color: `target-color` in blue-green
/// mode, the bare target otherwise. The compose overlay and the proxy must
/// agree on this name.
pub fn colored_name(target: &str, color: &str, blue_green: bool) -> String {
    if blue_green {
        format!("{}-{}", target, color)
    } else {
        target.to_string()
    }
}

/// The compose services a run deploys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Primary compose service
    pub name: String,
    /// Auxiliary services deployed alongside, never color-qualified
    pub side_targets: Vec<String>,
    /// Whether two colored copies of the primary service are kept
    pub blue_green: bool,
}

impl DeploymentTarget {
    pub fn new(name: impl Into<String>, side_targets: Vec<String>, blue_green: bool) -> Self {
        Self {
            name: name.into(),
            side_targets,
            blue_green,
        }
    }

    /// Compose service name of the primary target for a color
    pub fn colored(&self, color: Color) -> String {
        colored_name(&self.name, color.as_str(), self.blue_green)
    }
}
