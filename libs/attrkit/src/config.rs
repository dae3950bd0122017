use serde::{Deserialize, Serialize};

/// Engine behaviour switches for request preparation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject attributes not allowed in POST on creation.
    #[serde(default = "default_true")]
    pub check_allow_post: bool,
    /// Reject attributes the schema does not declare.
    #[serde(default = "default_true")]
    pub verify_attributes: bool,
    /// Roles that may act on behalf of other projects.
    ///
    /// The engine never reads this field. Callers hand it to their
    /// [`ProjectContext`](crate::ProjectContext) implementation when
    /// building the per-request identity, e.g.
    /// `SecurityContext::builder().service_roles(..)`.
    #[serde(default = "default_service_roles")]
    pub service_roles: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_allow_post: default_true(),
            verify_attributes: default_true(),
            service_roles: default_service_roles(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_service_roles() -> Vec<String> {
    vec!["advsvc".to_owned(), "service".to_owned()]
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.check_allow_post);
        assert_eq!(config.service_roles, vec!["advsvc", "service"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<EngineConfig, _> = serde_json::from_str(r#"{"check_allow_put": true}"#);
        assert!(result.is_err());
    }
}
