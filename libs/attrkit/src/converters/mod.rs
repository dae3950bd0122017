//! Converter pipeline: named, composable value coercions.
//!
//! Built-in converters form a closed enum dispatched by an exhaustive match.
//! Collaborators extend the set through [`ConverterRegistry::register`],
//! which hands back a typed [`ConverterHandle`].

pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigurationError, ConvertError};

pub use builtin::{
    KVP_FLAG_SENTINEL, PROTOCOL_NAMES, cidr_to_canonical, ip_to_canonical, kvp_list_to_mapping,
    kvp_string_to_pair, none_to_empty_mapping, none_to_empty_sequence, to_boolean,
    to_boolean_or_none, to_int, to_positive_float_or_none, to_protocol, to_sequence,
};

/// Signature of a collaborator-supplied value converter.
pub type ConverterFn = dyn Fn(&Value) -> Result<Value, ConvertError> + Send + Sync;

/// Signature of a collaborator-supplied list-collapsing converter.
pub type ListConverterFn = dyn Fn(&[Value]) -> Result<Value, ConvertError> + Send + Sync;

/// Built-in whole-value converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinConverter {
    ToBoolean,
    ToBooleanOrNone,
    ToInt,
    ToPositiveFloatOrNone,
    NoneToEmptySequence,
    NoneToEmptyMapping,
    ToSequence,
    IpToCanonical,
    CidrToCanonical,
    ToProtocol,
}

impl BuiltinConverter {
    pub const ALL: &'static [Self] = &[
        Self::ToBoolean,
        Self::ToBooleanOrNone,
        Self::ToInt,
        Self::ToPositiveFloatOrNone,
        Self::NoneToEmptySequence,
        Self::NoneToEmptyMapping,
        Self::ToSequence,
        Self::IpToCanonical,
        Self::CidrToCanonical,
        Self::ToProtocol,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ToBoolean => "to_boolean",
            Self::ToBooleanOrNone => "to_boolean_or_none",
            Self::ToInt => "to_int",
            Self::ToPositiveFloatOrNone => "to_positive_float_or_none",
            Self::NoneToEmptySequence => "none_to_empty_sequence",
            Self::NoneToEmptyMapping => "none_to_empty_mapping",
            Self::ToSequence => "to_sequence",
            Self::IpToCanonical => "ip_to_canonical",
            Self::CidrToCanonical => "cidr_to_canonical",
            Self::ToProtocol => "to_protocol",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// # Errors
    ///
    /// Returns [`ConvertError`] when the input cannot be coerced.
    pub fn apply(self, value: &Value) -> Result<Value, ConvertError> {
        match self {
            Self::ToBoolean => to_boolean(value),
            Self::ToBooleanOrNone => to_boolean_or_none(value),
            Self::ToInt => to_int(value),
            Self::ToPositiveFloatOrNone => to_positive_float_or_none(value),
            Self::NoneToEmptySequence => none_to_empty_sequence(value),
            Self::NoneToEmptyMapping => none_to_empty_mapping(value),
            Self::ToSequence => builtin::to_sequence_value(value),
            Self::IpToCanonical => ip_to_canonical(value),
            Self::CidrToCanonical => cidr_to_canonical(value),
            Self::ToProtocol => to_protocol(value),
        }
    }
}

/// Built-in list-collapsing converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinListConverter {
    KvpListToMapping,
}

impl BuiltinListConverter {
    pub const ALL: &'static [Self] = &[Self::KvpListToMapping];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::KvpListToMapping => "kvp_list_to_mapping",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// A registered collaborator converter.
#[derive(Clone)]
pub struct ConverterHandle {
    name: Arc<str>,
    func: Arc<ConverterFn>,
}

impl ConverterHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ConverterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A registered collaborator list converter.
#[derive(Clone)]
pub struct ListConverterHandle {
    name: Arc<str>,
    func: Arc<ListConverterFn>,
}

impl ListConverterHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ListConverterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListConverterHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One step of a conversion pipeline.
#[derive(Debug, Clone)]
pub enum Converter {
    Builtin(BuiltinConverter),
    Custom(ConverterHandle),
}

impl Converter {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(b) => b.name(),
            Self::Custom(h) => h.name(),
        }
    }

    /// # Errors
    ///
    /// Propagates the converter's [`ConvertError`].
    pub fn apply(&self, value: &Value) -> Result<Value, ConvertError> {
        match self {
            Self::Builtin(b) => b.apply(value),
            Self::Custom(h) => (h.func)(value),
        }
    }
}

impl From<BuiltinConverter> for Converter {
    fn from(b: BuiltinConverter) -> Self {
        Self::Builtin(b)
    }
}

impl From<ConverterHandle> for Converter {
    fn from(h: ConverterHandle) -> Self {
        Self::Custom(h)
    }
}

/// An ordered chain of converters applied left to right.
#[derive(Debug, Clone, Default)]
pub struct ConverterPipeline {
    steps: Vec<Converter>,
}

impl ConverterPipeline {
    #[must_use]
    pub fn new(steps: Vec<Converter>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn single(step: impl Into<Converter>) -> Self {
        Self {
            steps: vec![step.into()],
        }
    }

    #[must_use]
    pub fn then(mut self, step: impl Into<Converter>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// # Errors
    ///
    /// Returns the first failing step's [`ConvertError`].
    pub fn apply(&self, value: &Value) -> Result<Value, ConvertError> {
        let mut current = value.clone();
        for step in &self.steps {
            current = step.apply(&current)?;
        }
        Ok(current)
    }
}

impl From<BuiltinConverter> for ConverterPipeline {
    fn from(b: BuiltinConverter) -> Self {
        Self::single(b)
    }
}

/// Converter applied after coercing the value to a sequence.
#[derive(Debug, Clone)]
pub enum ListConverter {
    Builtin(BuiltinListConverter),
    Custom(ListConverterHandle),
}

impl ListConverter {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(b) => b.name(),
            Self::Custom(h) => h.name(),
        }
    }

    /// Coerce `value` to a sequence and collapse it.
    ///
    /// A mapping fed to [`BuiltinListConverter::KvpListToMapping`] is already
    /// canonical and is returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the converter's [`ConvertError`].
    pub fn apply(&self, value: &Value) -> Result<Value, ConvertError> {
        match self {
            Self::Builtin(BuiltinListConverter::KvpListToMapping) => {
                if value.is_object() {
                    return Ok(value.clone());
                }
                kvp_list_to_mapping(&to_sequence(value))
            }
            Self::Custom(h) => (h.func)(&to_sequence(value)),
        }
    }
}

impl From<BuiltinListConverter> for ListConverter {
    fn from(b: BuiltinListConverter) -> Self {
        Self::Builtin(b)
    }
}

#[derive(Clone)]
enum CustomConverter {
    Value(ConverterHandle),
    List(ListConverterHandle),
}

/// Name-to-converter table used when loading declarative schemas.
///
/// Populate it at startup, then share it read-only.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    custom: HashMap<String, CustomConverter>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("custom", &names)
            .finish()
    }
}

impl ConverterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn is_bound(&self, name: &str) -> bool {
        BuiltinConverter::from_name(name).is_some()
            || BuiltinListConverter::from_name(name).is_some()
            || self.custom.contains_key(name)
    }

    /// Register a whole-value converter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateConverter`] if `name` is taken,
    /// including by a built-in.
    pub fn register<F>(
        &mut self,
        name: &str,
        func: F,
    ) -> Result<ConverterHandle, ConfigurationError>
    where
        F: Fn(&Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        if self.is_bound(name) {
            return Err(ConfigurationError::DuplicateConverter {
                name: name.to_owned(),
            });
        }
        let handle = ConverterHandle {
            name: Arc::from(name),
            func: Arc::new(func),
        };
        self.custom
            .insert(name.to_owned(), CustomConverter::Value(handle.clone()));
        tracing::debug!(converter = name, "registered converter");
        Ok(handle)
    }

    /// Register a list-collapsing converter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateConverter`] if `name` is taken.
    pub fn register_list<F>(
        &mut self,
        name: &str,
        func: F,
    ) -> Result<ListConverterHandle, ConfigurationError>
    where
        F: Fn(&[Value]) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        if self.is_bound(name) {
            return Err(ConfigurationError::DuplicateConverter {
                name: name.to_owned(),
            });
        }
        let handle = ListConverterHandle {
            name: Arc::from(name),
            func: Arc::new(func),
        };
        self.custom
            .insert(name.to_owned(), CustomConverter::List(handle.clone()));
        tracing::debug!(converter = name, "registered list converter");
        Ok(handle)
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownConverter`] if `name` is not a
    /// whole-value converter.
    pub fn lookup(&self, name: &str) -> Result<Converter, ConfigurationError> {
        if let Some(b) = BuiltinConverter::from_name(name) {
            return Ok(Converter::Builtin(b));
        }
        match self.custom.get(name) {
            Some(CustomConverter::Value(h)) => Ok(Converter::Custom(h.clone())),
            Some(CustomConverter::List(_)) | None => Err(ConfigurationError::UnknownConverter {
                name: name.to_owned(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownConverter`] if `name` is not a
    /// list converter.
    pub fn lookup_list(&self, name: &str) -> Result<ListConverter, ConfigurationError> {
        if let Some(b) = BuiltinListConverter::from_name(name) {
            return Ok(ListConverter::Builtin(b));
        }
        match self.custom.get(name) {
            Some(CustomConverter::List(h)) => Ok(ListConverter::Custom(h.clone())),
            Some(CustomConverter::Value(_)) | None => Err(ConfigurationError::UnknownConverter {
                name: name.to_owned(),
            }),
        }
    }
}
