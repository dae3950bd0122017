//! Validator registry and rule dispatch.
//!
//! ## Rule shapes
//!
//! A rule is either a *leaf* rule, whose parameter is an optional JSON value
//! (a max length, a list of allowed values, a range), or a *nested* rule,
//! whose parameter is a mapping of key name to [`AttributeSpec`] describing
//! the members of a structured value. The shape is fixed by the validator
//! kind, so a nested rule can never carry a leaf parameter.
//!
//! ## Dispatch
//!
//! Built-in validators are closed enums ([`LeafValidator`],
//! [`DictValidator`]) checked by exhaustive match. Collaborators register
//! extra validators by name and get back typed handles. Rules on one
//! attribute are evaluated in declaration order and the first failure wins.

pub mod builtin;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::converters::builtin::display;
use crate::error::ConfigurationError;
use crate::spec::AttributeSpec;

/// Nested key specs of a structured rule.
pub type NestedSpecs = BTreeMap<String, AttributeSpec>;

/// Collaborator leaf validator: `(value, param) -> Ok | Err(diagnostic)`.
pub type ValidatorFn = dyn Fn(&Value, Option<&Value>) -> Result<(), String> + Send + Sync;

/// Collaborator structured validator.
pub type NestedValidatorFn = dyn Fn(&Value, &NestedSpecs) -> Result<(), String> + Send + Sync;

/// Built-in validators taking a leaf parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafValidator {
    Uuid,
    UuidOrNone,
    UuidList,
    String,
    StringOrNone,
    NotEmptyString,
    NotEmptyStringOrNone,
    Values,
    Range,
    RangeOrNone,
    NonNegative,
    Boolean,
    Regex,
    RegexOrNone,
    MacAddress,
    IpAddress,
    IpAddressOrNone,
    Subnet,
    SubnetOrNone,
    ListOfUniqueStrings,
}

impl LeafValidator {
    pub const ALL: &'static [Self] = &[
        Self::Uuid,
        Self::UuidOrNone,
        Self::UuidList,
        Self::String,
        Self::StringOrNone,
        Self::NotEmptyString,
        Self::NotEmptyStringOrNone,
        Self::Values,
        Self::Range,
        Self::RangeOrNone,
        Self::NonNegative,
        Self::Boolean,
        Self::Regex,
        Self::RegexOrNone,
        Self::MacAddress,
        Self::IpAddress,
        Self::IpAddressOrNone,
        Self::Subnet,
        Self::SubnetOrNone,
        Self::ListOfUniqueStrings,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Uuid => "type:uuid",
            Self::UuidOrNone => "type:uuid_or_none",
            Self::UuidList => "type:uuid_list",
            Self::String => "type:string",
            Self::StringOrNone => "type:string_or_none",
            Self::NotEmptyString => "type:not_empty_string",
            Self::NotEmptyStringOrNone => "type:not_empty_string_or_none",
            Self::Values => "type:values",
            Self::Range => "type:range",
            Self::RangeOrNone => "type:range_or_none",
            Self::NonNegative => "type:non_negative",
            Self::Boolean => "type:boolean",
            Self::Regex => "type:regex",
            Self::RegexOrNone => "type:regex_or_none",
            Self::MacAddress => "type:mac_address",
            Self::IpAddress => "type:ip_address",
            Self::IpAddressOrNone => "type:ip_address_or_none",
            Self::Subnet => "type:subnet",
            Self::SubnetOrNone => "type:subnet_or_none",
            Self::ListOfUniqueStrings => "type:list_of_unique_strings",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    /// Check that a declared parameter has the shape this validator reads.
    ///
    /// # Errors
    ///
    /// Returns a reason string when the parameter cannot be used.
    pub fn check_param(self, param: Option<&Value>) -> Result<(), String> {
        match self {
            Self::Values => match param {
                Some(Value::Array(_)) => Ok(()),
                _ => Err("expected a list of allowed values".to_owned()),
            },
            Self::Range | Self::RangeOrNone => match param {
                Some(Value::Array(b))
                    if b.len() == 2 && b.iter().all(|v| v.is_null() || v.is_i64()) =>
                {
                    Ok(())
                }
                _ => Err("expected [min, max]".to_owned()),
            },
            Self::String
            | Self::StringOrNone
            | Self::NotEmptyString
            | Self::NotEmptyStringOrNone
            | Self::ListOfUniqueStrings => match param {
                None | Some(Value::Null) => Ok(()),
                Some(v) if v.is_u64() => Ok(()),
                Some(_) => Err("expected a maximum length".to_owned()),
            },
            Self::Regex | Self::RegexOrNone => compile_pattern(param).map(|_| ()),
            Self::Uuid
            | Self::UuidOrNone
            | Self::UuidList
            | Self::NonNegative
            | Self::Boolean
            | Self::MacAddress
            | Self::IpAddress
            | Self::IpAddressOrNone
            | Self::Subnet
            | Self::SubnetOrNone => Ok(()),
        }
    }

    /// Validators that match against a compiled regular expression.
    #[must_use]
    pub fn is_pattern(self) -> bool {
        matches!(self, Self::Regex | Self::RegexOrNone)
    }

    /// `pattern` is the compiled parameter of a regex validator; regex
    /// validators reject every value without it.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic for an invalid value.
    pub fn check(
        self,
        value: &Value,
        param: Option<&Value>,
        pattern: Option<&Regex>,
    ) -> Result<(), String> {
        let nullable = matches!(
            self,
            Self::UuidOrNone
                | Self::StringOrNone
                | Self::NotEmptyStringOrNone
                | Self::RangeOrNone
                | Self::RegexOrNone
                | Self::IpAddressOrNone
                | Self::SubnetOrNone
        );
        if nullable && value.is_null() {
            return Ok(());
        }
        match self {
            Self::Uuid | Self::UuidOrNone => builtin::uuid(value),
            Self::UuidList => builtin::uuid_list(value),
            Self::String | Self::StringOrNone => builtin::string(value, param),
            Self::NotEmptyString | Self::NotEmptyStringOrNone => {
                builtin::not_empty_string(value, param)
            }
            Self::Values => builtin::values(value, param),
            Self::Range | Self::RangeOrNone => builtin::range(value, param),
            Self::NonNegative => builtin::non_negative(value),
            Self::Boolean => builtin::boolean(value),
            Self::Regex | Self::RegexOrNone => builtin::regex(value, pattern),
            Self::MacAddress => builtin::mac_address(value),
            Self::IpAddress | Self::IpAddressOrNone => builtin::ip_address(value),
            Self::Subnet | Self::SubnetOrNone => builtin::subnet(value),
            Self::ListOfUniqueStrings => builtin::list_of_unique_strings(value, param),
        }
    }
}

/// Built-in validators whose parameter is a set of nested key specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictValidator {
    Dict,
    DictOrNone,
    DictOrEmpty,
    DictOrNodata,
    ListOfDict,
}

impl DictValidator {
    pub const ALL: &'static [Self] = &[
        Self::Dict,
        Self::DictOrNone,
        Self::DictOrEmpty,
        Self::DictOrNodata,
        Self::ListOfDict,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Dict => "type:dict",
            Self::DictOrNone => "type:dict_or_none",
            Self::DictOrEmpty => "type:dict_or_empty",
            Self::DictOrNodata => "type:dict_or_nodata",
            Self::ListOfDict => "type:list_of_dict",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    /// # Errors
    ///
    /// Returns the first diagnostic found in the value or its members.
    pub fn check(self, value: &Value, specs: &NestedSpecs) -> Result<(), String> {
        let is_empty_map = value.as_object().is_some_and(serde_json::Map::is_empty);
        match self {
            Self::Dict => validate_dict(value, specs),
            Self::DictOrNone if value.is_null() => Ok(()),
            Self::DictOrEmpty if is_empty_map => Ok(()),
            Self::DictOrNodata if value.is_null() || is_empty_map => Ok(()),
            Self::DictOrNone | Self::DictOrEmpty | Self::DictOrNodata => {
                validate_dict(value, specs)
            }
            Self::ListOfDict => {
                let Value::Array(items) = value else {
                    return Err(format!("'{}' is not a list", display(value)));
                };
                items.iter().try_for_each(|item| validate_dict(item, specs))
            }
        }
    }
}

/// Validate a structured value against nested key specs.
///
/// The value must be a mapping, every `required` key must be present, and
/// each present key's rules are dispatched in order. Keys without a spec are
/// accepted.
///
/// # Errors
///
/// Returns the first diagnostic encountered.
pub fn validate_dict(value: &Value, specs: &NestedSpecs) -> Result<(), String> {
    let Value::Object(map) = value else {
        return Err(format!("'{}' is not a dictionary", display(value)));
    };
    if specs.is_empty() {
        return Ok(());
    }

    let required: Vec<&str> = specs
        .iter()
        .filter(|(_, spec)| spec.required)
        .map(|(k, _)| k.as_str())
        .collect();
    if required.iter().any(|k| !map.contains_key(*k)) {
        let mut provided: Vec<&str> = map.keys().map(String::as_str).collect();
        provided.sort_unstable();
        return Err(format!(
            "Validation of dictionary's keys failed. Expected keys: [{}] Provided keys: [{}]",
            required.join(", "),
            provided.join(", ")
        ));
    }

    for (key, spec) in specs {
        if let Some(item) = map.get(key) {
            dispatch(&spec.validate, item)?;
        }
    }
    Ok(())
}

fn compile_pattern(param: Option<&Value>) -> Result<Regex, String> {
    let pattern = param
        .and_then(Value::as_str)
        .ok_or_else(|| "expected a regular expression".to_owned())?;
    Regex::new(pattern).map_err(|e| e.to_string())
}

/// Evaluate `rules` in order against `value`, stopping at the first failure.
///
/// # Errors
///
/// Returns the failing rule's diagnostic.
pub fn dispatch(rules: &[Rule], value: &Value) -> Result<(), String> {
    rules.iter().try_for_each(|rule| rule.check(value))
}

/// A registered collaborator leaf validator.
#[derive(Clone)]
pub struct ValidatorHandle {
    name: Arc<str>,
    func: Arc<ValidatorFn>,
}

impl ValidatorHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ValidatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A registered collaborator structured validator.
#[derive(Clone)]
pub struct NestedValidatorHandle {
    name: Arc<str>,
    func: Arc<NestedValidatorFn>,
}

impl NestedValidatorHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NestedValidatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedValidatorHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum LeafKind {
    Builtin(LeafValidator),
    Custom(ValidatorHandle),
}

#[derive(Debug, Clone)]
pub enum NestedKind {
    Builtin(DictValidator),
    Custom(NestedValidatorHandle),
}

/// What a rule name resolves to in a [`ValidatorRegistry`].
#[derive(Debug, Clone)]
pub enum RuleKind {
    Leaf(LeafKind),
    Nested(NestedKind),
}

impl RuleKind {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(LeafKind::Builtin(v)) => v.name(),
            Self::Leaf(LeafKind::Custom(h)) => h.name(),
            Self::Nested(NestedKind::Builtin(v)) => v.name(),
            Self::Nested(NestedKind::Custom(h)) => h.name(),
        }
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }
}

/// One validator invocation on an attribute.
#[derive(Debug, Clone)]
pub enum Rule {
    Leaf {
        kind: LeafKind,
        param: Option<Value>,
        /// Compiled once when the rule is built.
        pattern: Option<Regex>,
    },
    Nested {
        kind: NestedKind,
        specs: NestedSpecs,
    },
}

impl Rule {
    /// Build a built-in leaf rule.
    ///
    /// A regex rule whose pattern does not compile rejects every value; use
    /// [`Rule::try_leaf`] to surface the error instead.
    #[must_use]
    pub fn leaf(validator: LeafValidator, param: Option<Value>) -> Self {
        let pattern = if validator.is_pattern() {
            compile_pattern(param.as_ref()).ok()
        } else {
            None
        };
        Self::Leaf {
            kind: LeafKind::Builtin(validator),
            param,
            pattern,
        }
    }

    /// Build a built-in leaf rule after checking its parameter.
    ///
    /// # Errors
    ///
    /// Returns the reason the parameter cannot be used by `validator`.
    pub fn try_leaf(validator: LeafValidator, param: Option<Value>) -> Result<Self, String> {
        let pattern = if validator.is_pattern() {
            Some(compile_pattern(param.as_ref())?)
        } else {
            validator.check_param(param.as_ref())?;
            None
        };
        Ok(Self::Leaf {
            kind: LeafKind::Builtin(validator),
            param,
            pattern,
        })
    }

    #[must_use]
    pub fn dict(validator: DictValidator, specs: NestedSpecs) -> Self {
        Self::Nested {
            kind: NestedKind::Builtin(validator),
            specs,
        }
    }

    #[must_use]
    pub fn custom(handle: &ValidatorHandle, param: Option<Value>) -> Self {
        Self::Leaf {
            kind: LeafKind::Custom(handle.clone()),
            param,
            pattern: None,
        }
    }

    #[must_use]
    pub fn custom_nested(handle: &NestedValidatorHandle, specs: NestedSpecs) -> Self {
        Self::Nested {
            kind: NestedKind::Custom(handle.clone()),
            specs,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf {
                kind: LeafKind::Builtin(v),
                ..
            } => v.name(),
            Self::Leaf {
                kind: LeafKind::Custom(h),
                ..
            } => h.name(),
            Self::Nested {
                kind: NestedKind::Builtin(v),
                ..
            } => v.name(),
            Self::Nested {
                kind: NestedKind::Custom(h),
                ..
            } => h.name(),
        }
    }

    /// Nested key specs, for structured rules.
    #[must_use]
    pub fn nested_specs(&self) -> Option<&NestedSpecs> {
        match self {
            Self::Nested { specs, .. } => Some(specs),
            Self::Leaf { .. } => None,
        }
    }

    /// # Errors
    ///
    /// Returns the diagnostic for an invalid value.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::Leaf {
                kind: LeafKind::Builtin(v),
                param,
                pattern,
            } => v.check(value, param.as_ref(), pattern.as_ref()),
            Self::Leaf {
                kind: LeafKind::Custom(h),
                param,
                ..
            } => (h.func)(value, param.as_ref()),
            Self::Nested {
                kind: NestedKind::Builtin(v),
                specs,
            } => v.check(value, specs),
            Self::Nested {
                kind: NestedKind::Custom(h),
                specs,
            } => (h.func)(value, specs),
        }
    }
}

#[derive(Clone)]
enum CustomValidator {
    Leaf(ValidatorHandle),
    Nested(NestedValidatorHandle),
}

/// Name-to-validator table.
///
/// Built-ins are always bound. Register collaborator validators at startup,
/// then share the registry read-only (it is `Send + Sync`).
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    custom: HashMap<String, CustomValidator>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ValidatorRegistry")
            .field("custom", &names)
            .finish()
    }
}

impl ValidatorRegistry {
    /// A registry holding only the built-in validators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `name` resolves to a validator.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        LeafValidator::from_name(name).is_some()
            || DictValidator::from_name(name).is_some()
            || self.custom.contains_key(name)
    }

    fn ensure_free(&self, name: &str) -> Result<(), ConfigurationError> {
        if self.contains(name) {
            tracing::warn!(validator = name, "duplicate validator registration");
            return Err(ConfigurationError::DuplicateValidator {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    /// Register a leaf validator under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateValidator`] if `name` is
    /// already bound, including to a built-in.
    pub fn register<F>(
        &mut self,
        name: &str,
        func: F,
    ) -> Result<ValidatorHandle, ConfigurationError>
    where
        F: Fn(&Value, Option<&Value>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.ensure_free(name)?;
        let handle = ValidatorHandle {
            name: Arc::from(name),
            func: Arc::new(func),
        };
        self.custom
            .insert(name.to_owned(), CustomValidator::Leaf(handle.clone()));
        tracing::debug!(validator = name, "registered validator");
        Ok(handle)
    }

    /// Register a structured validator under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateValidator`] if `name` is taken.
    pub fn register_nested<F>(
        &mut self,
        name: &str,
        func: F,
    ) -> Result<NestedValidatorHandle, ConfigurationError>
    where
        F: Fn(&Value, &NestedSpecs) -> Result<(), String> + Send + Sync + 'static,
    {
        self.ensure_free(name)?;
        let handle = NestedValidatorHandle {
            name: Arc::from(name),
            func: Arc::new(func),
        };
        self.custom
            .insert(name.to_owned(), CustomValidator::Nested(handle.clone()));
        tracing::debug!(validator = name, "registered structured validator");
        Ok(handle)
    }

    /// Resolve a rule name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownValidator`] if nothing is bound.
    pub fn lookup(&self, name: &str) -> Result<RuleKind, ConfigurationError> {
        if let Some(v) = LeafValidator::from_name(name) {
            return Ok(RuleKind::Leaf(LeafKind::Builtin(v)));
        }
        if let Some(v) = DictValidator::from_name(name) {
            return Ok(RuleKind::Nested(NestedKind::Builtin(v)));
        }
        match self.custom.get(name) {
            Some(CustomValidator::Leaf(h)) => Ok(RuleKind::Leaf(LeafKind::Custom(h.clone()))),
            Some(CustomValidator::Nested(h)) => {
                Ok(RuleKind::Nested(NestedKind::Custom(h.clone())))
            }
            None => Err(ConfigurationError::UnknownValidator {
                name: name.to_owned(),
            }),
        }
    }

    /// Names of all bound validators, built-ins first.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut custom: Vec<String> = self.custom.keys().cloned().collect();
        custom.sort_unstable();
        LeafValidator::ALL
            .iter()
            .map(|v| v.name().to_owned())
            .chain(DictValidator::ALL.iter().map(|v| v.name().to_owned()))
            .chain(custom)
            .collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    fn specs(entries: Vec<(&str, AttributeSpec)>) -> NestedSpecs {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    #[test]
    fn builtins_are_always_registered() {
        let registry = ValidatorRegistry::new();
        for name in [
            "type:uuid",
            "type:string",
            "type:values",
            "type:range",
            "type:dict",
            "type:boolean",
            "type:uuid_or_none",
        ] {
            assert!(registry.contains(name), "{name}");
        }
        assert!(registry.lookup("type:dict").unwrap().is_nested());
        assert!(!registry.lookup("type:uuid").unwrap().is_nested());
    }

    #[test]
    fn unknown_validator_is_configuration_error() {
        let registry = ValidatorRegistry::new();
        assert_eq!(
            registry.lookup("type:nope").unwrap_err(),
            ConfigurationError::UnknownValidator {
                name: "type:nope".to_owned()
            }
        );
    }

    #[test]
    #[traced_test]
    fn duplicate_registration_fails() {
        let mut registry = ValidatorRegistry::new();
        registry.register("type:even", |_, _| Ok(())).unwrap();
        assert!(matches!(
            registry.register("type:even", |_, _| Ok(())),
            Err(ConfigurationError::DuplicateValidator { .. })
        ));
        assert!(registry.register("type:uuid", |_, _| Ok(())).is_err());
        assert!(registry.register_nested("type:dict", |_, _| Ok(())).is_err());
        assert!(logs_contain("duplicate validator registration"));
    }

    #[test]
    fn custom_validator_dispatches_with_param() {
        let mut registry = ValidatorRegistry::new();
        let handle = registry
            .register("type:multiple_of", |value, param| {
                let n = value.as_i64().unwrap_or(1);
                let m = param.and_then(Value::as_i64).unwrap_or(1);
                if n % m == 0 {
                    Ok(())
                } else {
                    Err(format!("'{n}' is not a multiple of {m}"))
                }
            })
            .unwrap();
        let rule = Rule::custom(&handle, Some(json!(3)));
        assert!(rule.check(&json!(9)).is_ok());
        assert_eq!(rule.check(&json!(10)).unwrap_err(), "'10' is not a multiple of 3");
        assert!(matches!(
            registry.lookup("type:multiple_of"),
            Ok(RuleKind::Leaf(LeafKind::Custom(_)))
        ));
    }

    #[test]
    fn dispatch_stops_at_first_failure() {
        let rules = vec![
            Rule::leaf(LeafValidator::String, Some(json!(3))),
            Rule::leaf(LeafValidator::Values, Some(json!(["ab"]))),
        ];
        assert!(dispatch(&rules, &json!("ab")).is_ok());
        assert_eq!(
            dispatch(&rules, &json!("abcd")).unwrap_err(),
            "'abcd' exceeds maximum length of 3"
        );
        assert_eq!(
            dispatch(&rules, &json!("abc")).unwrap_err(),
            "'abc' is not in [ab]"
        );
    }

    #[test]
    fn dict_checks_required_keys_and_members() {
        let nested = specs(vec![
            (
                "id",
                AttributeSpec::new()
                    .required(true)
                    .rule(Rule::leaf(LeafValidator::Uuid, None)),
            ),
            (
                "size",
                AttributeSpec::new().rule(Rule::leaf(LeafValidator::Range, Some(json!([1, 5])))),
            ),
        ]);
        let rule = Rule::dict(DictValidator::Dict, nested);

        let id = "2f3b0a8e-4a3c-4c7e-9d55-0f0b7f6f2d11";
        assert!(rule.check(&json!({"id": id, "size": 2})).is_ok());
        assert!(rule.check(&json!({"id": id, "extra": true})).is_ok());
        assert_eq!(
            rule.check(&json!({"size": 2})).unwrap_err(),
            "Validation of dictionary's keys failed. Expected keys: [id] Provided keys: [size]"
        );
        assert_eq!(
            rule.check(&json!({"id": id, "size": 9})).unwrap_err(),
            "'9' is too large - must be no larger than '5'"
        );
        assert_eq!(rule.check(&json!("x")).unwrap_err(), "'x' is not a dictionary");
    }

    #[test]
    fn dict_variants_accept_their_empty_forms() {
        let empty = NestedSpecs::new();
        assert!(DictValidator::DictOrNone.check(&json!(null), &empty).is_ok());
        assert!(DictValidator::Dict.check(&json!(null), &empty).is_err());
        assert!(DictValidator::DictOrEmpty.check(&json!({}), &empty).is_ok());
        assert!(DictValidator::DictOrEmpty.check(&json!(null), &empty).is_err());
        assert!(DictValidator::DictOrNodata.check(&json!(null), &empty).is_ok());
        assert!(DictValidator::DictOrNodata.check(&json!({}), &empty).is_ok());
        assert!(DictValidator::ListOfDict.check(&json!([{}, {}]), &empty).is_ok());
        assert!(DictValidator::ListOfDict.check(&json!([{}, 1]), &empty).is_err());
    }

    #[test]
    fn nullable_leaf_variants() {
        assert!(LeafValidator::UuidOrNone.check(&json!(null), None, None).is_ok());
        assert!(LeafValidator::Uuid.check(&json!(null), None, None).is_err());
        assert!(LeafValidator::StringOrNone.check(&json!(null), None, None).is_ok());
        assert!(LeafValidator::RegexOrNone.check(&json!(null), None, None).is_ok());
    }

    #[test]
    fn param_shapes_are_checked() {
        assert!(LeafValidator::Values.check_param(Some(&json!(["a"]))).is_ok());
        assert!(LeafValidator::Values.check_param(None).is_err());
        assert!(LeafValidator::Range.check_param(Some(&json!([0, null]))).is_ok());
        assert!(LeafValidator::Range.check_param(Some(&json!([0]))).is_err());
        assert!(LeafValidator::String.check_param(Some(&json!(255))).is_ok());
        assert!(LeafValidator::String.check_param(Some(&json!("x"))).is_err());
        assert!(LeafValidator::Regex.check_param(Some(&json!("(unclosed"))).is_err());
    }

    #[test]
    fn regex_rule_is_compiled_once_at_build() {
        let rule = Rule::try_leaf(LeafValidator::Regex, Some(json!("^[a-z]+"))).unwrap();
        assert!(matches!(rule, Rule::Leaf { pattern: Some(_), .. }));
        assert!(rule.check(&json!("abc")).is_ok());
        assert!(rule.check(&json!("1abc")).is_err());

        assert!(Rule::try_leaf(LeafValidator::Regex, Some(json!("(unclosed"))).is_err());
        assert!(Rule::try_leaf(LeafValidator::String, Some(json!("x"))).is_err());

        let broken = Rule::leaf(LeafValidator::Regex, Some(json!("(unclosed")));
        assert_eq!(
            broken.check(&json!("abc")).unwrap_err(),
            "'abc' is not a valid input"
        );
    }
}
