//! Consul template handling
//!
//! Templates are read locally, the `SERVICE_NAME` placeholder is replaced
//! with the colored service identity and the result is written next to the
//! source as `<path>.tmp` before being copied into the proxy container.

use crate::error::{FlowError, Result};
use std::path::{Path, PathBuf};

/// Placeholder substituted with the service identity
pub const SERVICE_NAME_PLACEHOLDER: &str = "SERVICE_NAME";

/// Directory inside the proxy container holding uploaded templates
pub const TEMPLATES_DIR: &str = "/consul_templates";

/// Frontend and backend consul templates of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    pub frontend: PathBuf,
    pub backend: PathBuf,
}

/// Which half of the proxy configuration a template describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Frontend,
    Backend,
}

impl TemplateKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            TemplateKind::Frontend => "fe",
            TemplateKind::Backend => "be",
        }
    }

    /// Location of the uploaded template inside the proxy container
    pub fn remote_path(&self, service_name: &str) -> String {
        format!("{}/{}-{}.tmpl", TEMPLATES_DIR, service_name, self.suffix())
    }
}

/// Local path of the materialized copy of a template
pub fn temp_path(source: &Path) -> PathBuf {
    let mut path = source.as_os_str().to_owned();
    path.push(".tmp");
    PathBuf::from(path)
}

/// Write `<source>.tmp` with the placeholder replaced by `identity`
pub fn materialize(source: &Path, identity: &str) -> Result<PathBuf> {
    let data = std::fs::read_to_string(source).map_err(|e| FlowError::TemplateFile {
        path: source.to_path_buf(),
        source: e,
    })?;

    let target = temp_path(source);
    std::fs::write(&target, data.replace(SERVICE_NAME_PLACEHOLDER, identity)).map_err(|e| {
        FlowError::TemplateFile {
            path: target.clone(),
            source: e,
        }
    })?;
    Ok(target)
}
