//! Engine configuration loading

use std::path::Path;

use anyhow::Context;
use attrkit::EngineConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "ATTRKIT_";

const KEYS: &[&str] = &["check_allow_post", "verify_attributes", "service_roles"];

/// Defaults, then the optional YAML file, then `ATTRKIT_*` variables.
///
/// # Errors
///
/// Fails if the file cannot be read or a value does not fit [`EngineConfig`].
pub fn load(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
    if let Some(path) = path {
        anyhow::ensure!(path.is_file(), "configuration file {} not found", path.display());
        figment = figment.merge(Yaml::file(path));
    }
    let config: EngineConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).only(KEYS))
        .extract()
        .with_context(|| match path {
            Some(p) => format!("invalid configuration in {}", p.display()),
            None => "invalid configuration".to_owned(),
        })?;
    tracing::debug!(
        check_allow_post = config.check_allow_post,
        verify_attributes = config.verify_attributes,
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load(None).unwrap();
        assert!(config.check_allow_post);
        assert!(config.verify_attributes);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "verify_attributes: false\nservice_roles: [orchestrator]").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert!(!config.verify_attributes);
        assert!(config.check_allow_post);
        assert_eq!(config.service_roles, vec!["orchestrator"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/attrkit.yaml"))).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "verify_everything: true").unwrap();
        assert!(load(Some(file.path())).is_err());
    }
}
