//! Typed view of one attribute's declarative entry.

use serde_json::Value;

use crate::converters::{ConverterPipeline, ListConverter};
use crate::validators::{NestedSpecs, Rule};
use crate::value::AttrDefault;

/// Declarative description of one resource attribute.
///
/// Built once when a schema is loaded and read-only afterwards. The
/// builder methods mirror the field names.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default)]
pub struct AttributeSpec {
    /// May appear in creation requests.
    pub allow_post: bool,
    /// May appear in update requests.
    pub allow_put: bool,
    /// `None` means the attribute has no default and is required on POST.
    pub default: Option<AttrDefault>,
    /// Treat an explicit `null` as "not specified".
    pub default_overrides_none: bool,
    pub convert_to: Option<ConverterPipeline>,
    pub convert_list_to: Option<ListConverter>,
    /// Rules in declaration order.
    pub validate: Vec<Rule>,
    /// Fill nested defaults into a structured value.
    pub dict_populate_defaults: bool,
    /// For nested key specs: the key must be present.
    pub required: bool,
    pub enforce_policy: bool,
    pub required_by_policy: bool,
    pub is_visible: bool,
    pub is_filter: bool,
    pub is_sort_key: bool,
    pub primary_key: bool,
}

impl AttributeSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn allow_post(mut self, allow: bool) -> Self {
        self.allow_post = allow;
        self
    }

    #[must_use]
    pub fn allow_put(mut self, allow: bool) -> Self {
        self.allow_put = allow;
        self
    }

    /// Set a concrete default (which may be `null`).
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(AttrDefault::Value(value));
        self
    }

    /// Default to the "not specified" marker.
    #[must_use]
    pub fn default_not_specified(mut self) -> Self {
        self.default = Some(AttrDefault::NotSpecified);
        self
    }

    #[must_use]
    pub fn default_overrides_none(mut self, flag: bool) -> Self {
        self.default_overrides_none = flag;
        self
    }

    #[must_use]
    pub fn convert_to(mut self, pipeline: impl Into<ConverterPipeline>) -> Self {
        self.convert_to = Some(pipeline.into());
        self
    }

    #[must_use]
    pub fn convert_list_to(mut self, converter: impl Into<ListConverter>) -> Self {
        self.convert_list_to = Some(converter.into());
        self
    }

    /// Append a validation rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.validate.push(rule);
        self
    }

    #[must_use]
    pub fn dict_populate_defaults(mut self, flag: bool) -> Self {
        self.dict_populate_defaults = flag;
        self
    }

    #[must_use]
    pub fn required(mut self, flag: bool) -> Self {
        self.required = flag;
        self
    }

    #[must_use]
    pub fn enforce_policy(mut self, flag: bool) -> Self {
        self.enforce_policy = flag;
        self
    }

    #[must_use]
    pub fn required_by_policy(mut self, flag: bool) -> Self {
        self.required_by_policy = flag;
        self
    }

    #[must_use]
    pub fn is_visible(mut self, flag: bool) -> Self {
        self.is_visible = flag;
        self
    }

    #[must_use]
    pub fn is_filter(mut self, flag: bool) -> Self {
        self.is_filter = flag;
        self
    }

    #[must_use]
    pub fn is_sort_key(mut self, flag: bool) -> Self {
        self.is_sort_key = flag;
        self
    }

    #[must_use]
    pub fn primary_key(mut self, flag: bool) -> Self {
        self.primary_key = flag;
        self
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Structured rules of this spec with their nested key specs.
    pub fn structured_rules(&self) -> impl Iterator<Item = (&Rule, &NestedSpecs)> {
        self.validate
            .iter()
            .filter_map(|rule| rule.nested_specs().map(|specs| (rule, specs)))
    }

    #[must_use]
    pub fn is_structured(&self) -> bool {
        self.structured_rules().next().is_some()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validators::{DictValidator, LeafValidator};

    #[test]
    fn builder_sets_fields() {
        let spec = AttributeSpec::new()
            .allow_post(true)
            .allow_put(true)
            .default_value(json!(5))
            .is_visible(true)
            .rule(Rule::leaf(LeafValidator::Range, Some(json!([0, 10]))));

        assert!(spec.allow_post);
        assert!(spec.allow_put);
        assert_eq!(spec.default, Some(AttrDefault::Value(json!(5))));
        assert!(spec.has_default());
        assert!(!spec.is_structured());
        assert_eq!(spec.validate.len(), 1);
    }

    #[test]
    fn structured_rules_are_discovered_by_shape() {
        let spec = AttributeSpec::new()
            .rule(Rule::leaf(LeafValidator::StringOrNone, None))
            .rule(Rule::dict(DictValidator::DictOrNone, NestedSpecs::new()));
        let names: Vec<&str> = spec.structured_rules().map(|(r, _)| r.name()).collect();
        assert_eq!(names, vec!["type:dict_or_none"]);
    }

    #[test]
    fn missing_default_means_required() {
        let spec = AttributeSpec::new().allow_post(true);
        assert!(!spec.has_default());
        assert!(AttributeSpec::new().default_not_specified().has_default());
    }
}
