//! Request preparation: the façade stages run in their fixed order.

use std::fmt;

use crate::config::EngineConfig;
use crate::context::ProjectContext;
use crate::error::AttributeError;
use crate::info::AttributeInfo;
use crate::schema::Schema;
use crate::value::RequestBody;

/// The mutation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
}

impl Action {
    #[must_use]
    pub fn is_create(self) -> bool {
        matches!(self, Self::Create)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// Runs every preparation stage for one resource under one configuration.
///
/// Create: project id, POST defaults, conversion and validation, unknown
/// attribute rejection. Update: project id, PUT permissions, conversion and
/// validation, unknown attribute rejection. The first failing stage aborts.
#[derive(Debug, Clone, Copy)]
pub struct RequestPipeline<'a> {
    info: AttributeInfo<'a>,
    config: &'a EngineConfig,
}

impl<'a> RequestPipeline<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema, config: &'a EngineConfig) -> Self {
        Self {
            info: AttributeInfo::new(schema),
            config,
        }
    }

    #[must_use]
    pub fn info(&self) -> AttributeInfo<'a> {
        self.info
    }

    /// Prepare `body` in place.
    ///
    /// # Errors
    ///
    /// Returns the first stage's [`AttributeError`].
    pub fn prepare<C: ProjectContext + ?Sized>(
        &self,
        context: &C,
        body: &mut RequestBody,
        action: Action,
    ) -> Result<(), AttributeError> {
        let resource = self.info.schema().resource();
        let span = tracing::debug_span!("prepare", resource, %action);
        let _guard = span.enter();

        self.info
            .populate_project_id(context, body, action.is_create())?;
        match action {
            Action::Create => self
                .info
                .fill_post_defaults(body, self.config.check_allow_post)?,
            Action::Update => self.info.check_put_allowed(body)?,
        }
        self.info.convert_values(body)?;
        if self.config.verify_attributes {
            self.info.verify_attributes(body)?;
        }
        tracing::debug!(attributes = body.len(), "request prepared");
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{PROJECT_ID, TENANT_ID};
    use crate::spec::AttributeSpec;
    use crate::validators::{LeafValidator, Rule};
    use crate::value::AttrValue;

    struct Tenant;

    impl ProjectContext for Tenant {
        fn project_id(&self) -> Option<&str> {
            Some("p1")
        }

        fn is_admin(&self) -> bool {
            false
        }

        fn is_service_role(&self) -> bool {
            false
        }
    }

    fn networks() -> Schema {
        Schema::new("networks")
            .attribute(
                "name",
                AttributeSpec::new()
                    .allow_post(true)
                    .allow_put(true)
                    .default_value(json!(""))
                    .rule(Rule::leaf(LeafValidator::String, Some(json!(16)))),
            )
            .attribute(
                "shared",
                AttributeSpec::new()
                    .allow_post(true)
                    .default_value(json!(false))
                    .convert_to(crate::converters::BuiltinConverter::ToBoolean),
            )
            .attribute(
                TENANT_ID,
                AttributeSpec::new()
                    .allow_post(true)
                    .rule(Rule::leaf(LeafValidator::String, Some(json!(255)))),
            )
            .attribute(PROJECT_ID, AttributeSpec::new().allow_post(true))
    }

    #[test]
    fn create_runs_all_stages() {
        let schema = networks();
        let config = EngineConfig::default();
        let mut body = RequestBody::new();
        body.insert("shared", json!("true"));

        RequestPipeline::new(&schema, &config)
            .prepare(&Tenant, &mut body, Action::Create)
            .unwrap();
        assert_eq!(body.get("name"), AttrValue::Specified(json!("")));
        assert_eq!(body.get("shared"), AttrValue::Specified(json!(true)));
        assert_eq!(body.get(TENANT_ID), AttrValue::Specified(json!("p1")));
    }

    #[test]
    fn update_checks_put_permissions() {
        let schema = networks();
        let config = EngineConfig::default();
        let pipeline = RequestPipeline::new(&schema, &config);

        let mut body = RequestBody::new();
        body.insert("name", json!("renamed"));
        pipeline.prepare(&Tenant, &mut body, Action::Update).unwrap();
        assert!(!body.contains_key("shared"));

        let mut body = RequestBody::new();
        body.insert("shared", json!(true));
        let err = pipeline
            .prepare(&Tenant, &mut body, Action::Update)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot update read-only attribute 'shared'");
    }

    #[test]
    fn unknown_attributes_respect_config() {
        let schema = networks();
        let mut body = RequestBody::new();
        body.insert("color", json!("red"));

        let strict = EngineConfig::default();
        let err = RequestPipeline::new(&schema, &strict)
            .prepare(&Tenant, &mut body.clone(), Action::Create)
            .unwrap_err();
        assert!(matches!(err, AttributeError::BadRequest { .. }));

        let lenient = EngineConfig {
            verify_attributes: false,
            ..EngineConfig::default()
        };
        RequestPipeline::new(&schema, &lenient)
            .prepare(&Tenant, &mut body, Action::Create)
            .unwrap();
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Create.to_string(), "create");
        assert!(!Action::Update.is_create());
    }
}
