//! Declarative schema documents.
//!
//! A document lists resources and sub-resources, each a mapping of attribute
//! name to attribute entry:
//!
//! ```yaml
//! resources:
//!   ports:
//!     id: {allow_post: false, validate: {"type:uuid": null}, primary_key: true}
//!     name: {allow_post: true, allow_put: true, default: "", validate: {"type:string": 255}}
//! sub_resources:
//!   rules:
//!     parent: {collection_name: policies, member_name: policy}
//!     attributes:
//!       id: {allow_post: false}
//! ```
//!
//! Converter and validator names are resolved against the registries while
//! loading, so a schema that loads never fails on an unknown name later.
//! The order of entries in a `validate` mapping is the evaluation order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::converters::{ConverterPipeline, ConverterRegistry};
use crate::error::ConfigurationError;
use crate::schema::{AttributeMap, ParentRef, Schema, SchemaSet};
use crate::spec::AttributeSpec;
use crate::validators::{LeafKind, NestedSpecs, Rule, RuleKind, ValidatorRegistry};
use crate::value::AttrDefault;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    resources: BTreeMap<String, BTreeMap<String, RawSpec>>,
    #[serde(default)]
    sub_resources: BTreeMap<String, RawSubResource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSubResource {
    parent: RawParent,
    #[serde(default)]
    attributes: BTreeMap<String, RawSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParent {
    collection_name: String,
    member_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawConverters {
    One(String),
    Many(Vec<String>),
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpec {
    #[serde(default)]
    allow_post: bool,
    #[serde(default)]
    allow_put: bool,
    /// `Some(Value::Null)` for `default: null`, `None` when absent.
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    #[serde(default)]
    default_overrides_none: bool,
    #[serde(default)]
    convert_to: Option<RawConverters>,
    #[serde(default)]
    convert_list_to: Option<String>,
    #[serde(default)]
    validate: Option<Map<String, Value>>,
    #[serde(default)]
    dict_populate_defaults: bool,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    enforce_policy: bool,
    #[serde(default)]
    required_by_policy: bool,
    #[serde(default)]
    is_visible: bool,
    #[serde(default)]
    is_filter: bool,
    #[serde(default)]
    is_sort_key: bool,
    #[serde(default)]
    primary_key: bool,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Builds frozen [`SchemaSet`]s from YAML or JSON documents.
#[derive(Debug, Clone, Copy)]
pub struct SchemaLoader<'r> {
    converters: &'r ConverterRegistry,
    validators: &'r ValidatorRegistry,
}

impl<'r> SchemaLoader<'r> {
    #[must_use]
    pub fn new(converters: &'r ConverterRegistry, validators: &'r ValidatorRegistry) -> Self {
        Self {
            converters,
            validators,
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for unparsable documents and unknown or
    /// misused converter and validator names.
    pub fn load_yaml(&self, text: &str) -> Result<SchemaSet, ConfigurationError> {
        let raw: RawDocument = serde_saphyr::from_str(text).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse YAML schema document");
            ConfigurationError::Document(e.to_string())
        })?;
        self.build(raw)
    }

    /// # Errors
    ///
    /// See [`SchemaLoader::load_yaml`].
    pub fn load_json(&self, text: &str) -> Result<SchemaSet, ConfigurationError> {
        let raw: RawDocument = serde_json::from_str(text).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse JSON schema document");
            ConfigurationError::Document(e.to_string())
        })?;
        self.build(raw)
    }

    /// Load a document from disk. Files ending in `.json` are read as JSON,
    /// everything else as YAML.
    ///
    /// # Errors
    ///
    /// See [`SchemaLoader::load_yaml`]; I/O failures are reported as
    /// [`ConfigurationError::Document`].
    pub fn load_path(&self, path: &Path) -> Result<SchemaSet, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to read schema document");
            ConfigurationError::Document(format!("{}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loading schema document");
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            self.load_json(&text)
        } else {
            self.load_yaml(&text)
        }
    }

    /// Load an extension document and merge its resources into `set`.
    ///
    /// The extension uses the document format; every resource it names must
    /// already exist in `set`. Its `sub_resources` are added as new
    /// sub-resources.
    ///
    /// # Errors
    ///
    /// See [`SchemaLoader::load_yaml`] and [`SchemaSet::extend`].
    pub fn extend_yaml(&self, set: &mut SchemaSet, text: &str) -> Result<(), ConfigurationError> {
        let extension = self.load_yaml(text)?;
        for name in extension.resource_names() {
            let schema = extension.schema(name)?;
            set.extend(name, schema.attributes().clone())?;
        }
        for name in extension.sub_resource_names() {
            if let Some(sub) = extension.sub_resource(name) {
                set.insert_sub_resource(sub.parent.clone(), sub.schema.clone());
            }
        }
        Ok(())
    }

    fn build(&self, raw: RawDocument) -> Result<SchemaSet, ConfigurationError> {
        let mut set = SchemaSet::new();
        for (resource, attributes) in raw.resources {
            let attributes = self.attributes(&resource, attributes)?;
            set.insert_resource(Schema::with_attributes(resource, attributes));
        }
        for (resource, sub) in raw.sub_resources {
            let attributes = self.attributes(&resource, sub.attributes)?;
            set.insert_sub_resource(
                ParentRef::new(sub.parent.collection_name, sub.parent.member_name),
                Schema::with_attributes(resource, attributes),
            );
        }
        tracing::debug!(
            resources = set.resource_names().count(),
            sub_resources = set.sub_resource_names().count(),
            "schema document loaded"
        );
        Ok(set)
    }

    fn attributes(
        &self,
        path: &str,
        raw: BTreeMap<String, RawSpec>,
    ) -> Result<AttributeMap, ConfigurationError> {
        raw.into_iter()
            .map(|(name, spec)| {
                let spec = self.spec(&format!("{path}.{name}"), spec)?;
                Ok((name, spec))
            })
            .collect()
    }

    fn spec(&self, path: &str, raw: RawSpec) -> Result<AttributeSpec, ConfigurationError> {
        let convert_to = match raw.convert_to {
            None => None,
            Some(RawConverters::One(name)) => Some(self.pipeline(&[name])?),
            Some(RawConverters::Many(names)) => Some(self.pipeline(&names)?),
        };
        let convert_list_to = raw
            .convert_list_to
            .map(|name| self.converters.lookup_list(&name))
            .transpose()
            .inspect_err(|e| tracing::warn!(attribute = path, error = %e, "bad list converter"))?;

        let mut validate = Vec::new();
        for (name, param) in raw.validate.unwrap_or_default() {
            validate.push(self.rule(path, &name, param)?);
        }

        Ok(AttributeSpec {
            allow_post: raw.allow_post,
            allow_put: raw.allow_put,
            default: raw.default.map(AttrDefault::from_declared),
            default_overrides_none: raw.default_overrides_none,
            convert_to,
            convert_list_to,
            validate,
            dict_populate_defaults: raw.dict_populate_defaults,
            required: raw.required,
            enforce_policy: raw.enforce_policy,
            required_by_policy: raw.required_by_policy,
            is_visible: raw.is_visible,
            is_filter: raw.is_filter,
            is_sort_key: raw.is_sort_key,
            primary_key: raw.primary_key,
        })
    }

    fn pipeline(&self, names: &[String]) -> Result<ConverterPipeline, ConfigurationError> {
        let steps = names
            .iter()
            .map(|name| self.converters.lookup(name))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::warn!(error = %e, "bad converter"))?;
        Ok(ConverterPipeline::new(steps))
    }

    fn rule(&self, path: &str, name: &str, param: Value) -> Result<Rule, ConfigurationError> {
        let kind = self
            .validators
            .lookup(name)
            .inspect_err(|e| tracing::warn!(attribute = path, error = %e, "bad validator"))?;
        let invalid = |reason: String| {
            tracing::warn!(attribute = path, rule = name, %reason, "bad rule parameter");
            ConfigurationError::InvalidRuleParam {
                attribute: path.to_owned(),
                rule: name.to_owned(),
                reason,
            }
        };
        let leaf_param = if param.is_null() { None } else { Some(param) };

        match kind {
            RuleKind::Leaf(LeafKind::Builtin(validator)) => {
                Rule::try_leaf(validator, leaf_param).map_err(invalid)
            }
            RuleKind::Leaf(LeafKind::Custom(handle)) => Ok(Rule::custom(&handle, leaf_param)),
            RuleKind::Nested(kind) => {
                let specs = match leaf_param {
                    None => NestedSpecs::new(),
                    Some(Value::Object(map)) => self.nested(path, map)?,
                    Some(_) => {
                        return Err(invalid("expected a mapping of nested attributes".to_owned()));
                    }
                };
                Ok(Rule::Nested { kind, specs })
            }
        }
    }

    fn nested(
        &self,
        path: &str,
        map: Map<String, Value>,
    ) -> Result<NestedSpecs, ConfigurationError> {
        map.into_iter()
            .map(|(key, entry)| {
                let nested_path = format!("{path}.{key}");
                let raw: RawSpec = if entry.is_null() {
                    RawSpec::default()
                } else {
                    serde_json::from_value(entry).map_err(|e| {
                        tracing::warn!(
                            attribute = %nested_path,
                            error = %e,
                            "bad nested attribute"
                        );
                        ConfigurationError::Document(format!("{nested_path}: {e}"))
                    })?
                };
                let spec = self.spec(&nested_path, raw)?;
                Ok((key, spec))
            })
            .collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validators::dispatch;

    const PORTS: &str = r#"
resources:
  ports:
    id:
      allow_post: false
      allow_put: false
      validate: {"type:uuid": null}
      is_visible: true
      primary_key: true
    name:
      allow_post: true
      allow_put: true
      default: ""
      validate:
        "type:string": 3
        "type:values": ["ab", "abcd"]
    description:
      allow_post: true
      default: null
    binding:profile:
      allow_post: true
      default: ATTR_NOT_SPECIFIED
      convert_to: [none_to_empty_mapping]
      validate: {"type:dict_or_empty": {}}
    admin_state_up:
      allow_post: true
      default: true
      convert_to: to_boolean
    fixed_ips:
      allow_post: true
      dict_populate_defaults: true
      validate:
        "type:dict_or_none":
          subnet_id:
            required: true
            validate: {"type:uuid": null}
          weight:
            default: 1
            convert_to: to_int
sub_resources:
  rules:
    parent: {collection_name: policies, member_name: policy}
    attributes:
      id: {allow_post: false, is_visible: true}
"#;

    fn load(text: &str) -> Result<SchemaSet, ConfigurationError> {
        let converters = ConverterRegistry::new();
        let validators = ValidatorRegistry::new();
        SchemaLoader::new(&converters, &validators).load_yaml(text)
    }

    #[test]
    fn loads_resources_and_sub_resources() {
        let set = load(PORTS).unwrap();
        let ports = set.schema("ports").unwrap();
        assert_eq!(ports.len(), 6);
        assert!(ports.get("id").unwrap().primary_key);
        assert_eq!(
            set.sub_resource("rules").unwrap().parent,
            ParentRef::new("policies", "policy")
        );
    }

    #[test]
    fn defaults_distinguish_absent_null_and_marker() {
        let set = load(PORTS).unwrap();
        let ports = set.schema("ports").unwrap();
        assert_eq!(ports.get("id").unwrap().default, None);
        assert_eq!(
            ports.get("description").unwrap().default,
            Some(AttrDefault::Value(Value::Null))
        );
        assert_eq!(
            ports.get("binding:profile").unwrap().default,
            Some(AttrDefault::NotSpecified)
        );
    }

    #[test]
    fn rule_order_follows_the_document() {
        let set = load(PORTS).unwrap();
        let name = set.schema("ports").unwrap().get("name").unwrap();
        let names: Vec<&str> = name.validate.iter().map(Rule::name).collect();
        assert_eq!(names, vec!["type:string", "type:values"]);
        assert_eq!(
            dispatch(&name.validate, &json!("abcd")).unwrap_err(),
            "'abcd' exceeds maximum length of 3"
        );
    }

    #[test]
    fn converters_resolve_from_single_name_or_list() {
        let set = load(PORTS).unwrap();
        let ports = set.schema("ports").unwrap();
        let admin = ports.get("admin_state_up").unwrap();
        assert_eq!(
            admin.convert_to.as_ref().unwrap().apply(&json!("no")).unwrap(),
            json!(false)
        );
        let profile = ports.get("binding:profile").unwrap();
        assert_eq!(
            profile.convert_to.as_ref().unwrap().apply(&Value::Null).unwrap(),
            json!({})
        );
    }

    #[test]
    fn nested_specs_are_typed() {
        let set = load(PORTS).unwrap();
        let fixed_ips = set.schema("ports").unwrap().get("fixed_ips").unwrap();
        let (_, nested) = fixed_ips.structured_rules().next().unwrap();
        assert!(nested.get("subnet_id").unwrap().required);
        assert_eq!(
            nested.get("weight").unwrap().default,
            Some(AttrDefault::Value(json!(1)))
        );
    }

    #[test]
    fn unknown_names_fail_at_load_time() {
        let err = load("resources: {r: {a: {validate: {\"type:nope\": null}}}}").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownValidator {
                name: "type:nope".to_owned()
            }
        );
        let err = load("resources: {r: {a: {convert_to: to_nothing}}}").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownConverter { .. }));
        let err = load("resources: {r: {a: {convert_list_to: to_int}}}").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownConverter { .. }));
    }

    #[test]
    fn bad_parameters_fail_at_load_time() {
        let err = load("resources: {r: {a: {validate: {\"type:values\": 3}}}}").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidRuleParam { ref attribute, .. } if attribute == "r.a"
        ));
        let err = load("resources: {r: {a: {validate: {\"type:dict\": [1]}}}}").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidRuleParam { .. }));
    }

    #[test]
    fn malformed_documents_are_configuration_errors() {
        assert!(matches!(
            load("resources: {r: {a: {allow_pots: true}}}"),
            Err(ConfigurationError::Document(_))
        ));
        assert!(matches!(
            load("resources: [1, 2"),
            Err(ConfigurationError::Document(_))
        ));
    }

    #[test]
    fn custom_validators_are_resolved() {
        let converters = ConverterRegistry::new();
        let mut validators = ValidatorRegistry::new();
        validators
            .register("type:even", |v, _| {
                if v.as_i64().is_some_and(|n| n % 2 == 0) {
                    Ok(())
                } else {
                    Err("odd".to_owned())
                }
            })
            .unwrap();
        let set = SchemaLoader::new(&converters, &validators)
            .load_json(r#"{"resources": {"r": {"n": {"validate": {"type:even": null}}}}}"#)
            .unwrap();
        let rules = &set.schema("r").unwrap().get("n").unwrap().validate;
        assert!(dispatch(rules, &json!(4)).is_ok());
        assert!(dispatch(rules, &json!(3)).is_err());
    }

    #[test]
    fn extension_merges_into_existing_resources() {
        let converters = ConverterRegistry::new();
        let validators = ValidatorRegistry::new();
        let loader = SchemaLoader::new(&converters, &validators);
        let mut set = loader.load_yaml(PORTS).unwrap();

        loader
            .extend_yaml(
                &mut set,
                "resources: {ports: {dns_name: {allow_post: true, default: \"\"}}}",
            )
            .unwrap();
        assert!(set.schema("ports").unwrap().contains("dns_name"));

        let err = loader
            .extend_yaml(&mut set, "resources: {routers: {x: {}}}")
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownResource { .. }));
    }
}
