//! Docker Compose flow overlay generation
//!
//! The overlay is a short-lived compose file that `extends` the services of
//! the base compose file under color-qualified names, so that two copies of
//! the same service can run side by side.

use crate::error::{FlowError, Result};
use crate::flow::target::colored_name;
use std::path::{Path, PathBuf};

/// Default location of the overlay, relative to the working directory
pub const DEFAULT_OVERLAY_PATH: &str = "docker-compose-flow.yml.tmp";

/// What to put into an overlay
#[derive(Debug, Clone)]
pub struct OverlaySpec<'a> {
    /// Service identity published through `SERVICE_NAME`
    pub service_name: &'a str,
    /// Primary target as named in the base compose file
    pub target: &'a str,
    /// Auxiliary targets, never color-qualified
    pub side_targets: &'a [String],
    /// Color label for the primary target
    pub color: &'a str,
    /// Whether the primary target is color-qualified
    pub blue_green: bool,
}

/// Whether a base compose document uses the versioned (v2+) schema
pub fn is_versioned(base: &str) -> bool {
    base.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.to_lowercase().contains("version") && line.contains('2'))
        .unwrap_or(false)
}

/// Render the overlay document for a base compose file located at `base_path`
pub fn render(base: &str, base_path: &str, spec: &OverlaySpec<'_>) -> String {
    let (mut out, indent) = if is_versioned(base) {
        ("version: '2'\n\nservices:\n".to_string(), "  ")
    } else {
        (String::new(), "")
    };

    let primary = colored_name(spec.target, spec.color, spec.blue_green);
    out.push_str(&extends_block(indent, &primary, base_path, spec.target));
    out.push_str(&format!(
        "{indent}  environment:\n{indent}    - SERVICE_NAME={}-{}\n",
        spec.service_name, spec.color
    ));

    for side in spec.side_targets {
        out.push_str(&extends_block(indent, side, base_path, side));
    }

    out.trim_matches('\n').to_string()
}

fn extends_block(indent: &str, key: &str, base_path: &str, service: &str) -> String {
    format!(
        "{indent}{key}:\n\
         {indent}  extends:\n\
         {indent}    file: {base_path}\n\
         {indent}    service: {service}\n"
    )
}

/// The overlay file on disk
#[derive(Debug, Clone)]
pub struct OverlayFile {
    path: PathBuf,
}

impl Default for OverlayFile {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAY_PATH)
    }
}

impl OverlayFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generate the overlay from the base compose file and write it out
    pub fn create(&self, compose_path: &Path, spec: &OverlaySpec<'_>) -> Result<()> {
        let base = std::fs::read_to_string(compose_path).map_err(|source| {
            FlowError::ComposeFileRead {
                path: compose_path.to_path_buf(),
                source,
            }
        })?;

        let document = render(&base, &compose_path.to_string_lossy(), spec);
        tracing::debug!(
            "Writing {} for {} ({})",
            self.path.display(),
            spec.target,
            spec.color
        );

        std::fs::write(&self.path, document).map_err(|source| FlowError::ComposeFileWrite {
            path: self.path.clone(),
            source,
        })
    }

    /// Delete the overlay. A file that is already gone is not an error.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FlowError::ComposeFileRemove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
