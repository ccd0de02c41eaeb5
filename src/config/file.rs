//! `docker-flow.yml` flow file

use crate::error::{FlowError, Result};
use crate::flow::FlowStep;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from the flow file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub cert_path: Option<String>,
    pub compose_path: Option<PathBuf>,
    pub blue_green: bool,
    pub target: Option<String>,
    pub side_targets: Vec<String>,
    pub skip_pull_target: bool,
    pub pull_side_targets: bool,
    pub project: Option<String>,
    pub consul_address: Option<String>,
    /// Raw scale expression, `3`, `+1` and `"-2"` all keep their text
    pub scale: Option<String>,
    pub flow: Vec<FlowStep>,
    pub service_path: Vec<String>,
    pub proxy_host: Option<String>,
    pub proxy_docker_host: Option<String>,
    pub proxy_docker_cert_path: Option<String>,
    pub proxy_reconf_port: Option<u16>,
    pub consul_template_fe_path: Option<PathBuf>,
    pub consul_template_be_path: Option<PathBuf>,
    pub service_name: Option<String>,
}

impl FileConfig {
    /// Load a flow file. A missing file yields the empty configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No flow file at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(FlowError::Config(format!(
                    "could not read the flow file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        tracing::debug!("Loading flow file {}", path.display());
        Self::parse(&content).map_err(|e| match e {
            FlowError::Config(reason) => {
                FlowError::Config(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| FlowError::Config(format!("could not parse the flow file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_file() {
        let config = FileConfig::parse(
            r#"
target: app
side_targets:
  - db
blue_green: true
consul_address: http://consul:8500
scale: "+2"
flow:
  - deploy
  - stop-old
  - proxy
service_path:
  - /api/v1/books
proxy_host: proxy.example.com
proxy_reconf_port: 8081
"#,
        )
        .unwrap();

        assert_eq!(config.target.as_deref(), Some("app"));
        assert_eq!(config.side_targets, vec!["db"]);
        assert!(config.blue_green);
        assert!(!config.skip_pull_target);
        assert_eq!(config.scale.as_deref(), Some("+2"));
        assert_eq!(
            config.flow,
            vec![FlowStep::Deploy, FlowStep::StopOld, FlowStep::Proxy]
        );
        assert_eq!(config.proxy_reconf_port, Some(8081));
    }

    #[test]
    fn test_numeric_scale() {
        let config = FileConfig::parse("scale: 3").unwrap();
        assert_eq!(config.scale.as_deref(), Some("3"));
    }

    #[test]
    fn test_unquoted_signed_scale_keeps_sign() {
        assert_eq!(FileConfig::parse("scale: +2\n").unwrap().scale.as_deref(), Some("+2"));
        assert_eq!(FileConfig::parse("scale: -1\n").unwrap().scale.as_deref(), Some("-1"));
    }

    #[test]
    fn test_empty_and_missing_files() {
        assert_eq!(FileConfig::parse("\n").unwrap(), FileConfig::default());

        let dir = tempdir().unwrap();
        let config = FileConfig::load(&dir.path().join("docker-flow.yml")).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docker-flow.yml");
        std::fs::write(&path, "flow: [deploy, rollback]\n").unwrap();

        match FileConfig::load(&path) {
            Err(FlowError::Config(reason)) => assert!(reason.contains("docker-flow.yml")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
