#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Attribute schema engine
//!
//! Interprets declarative per-resource attribute maps at request time:
//!
//! - [`AttributeSpec`] - typed view of one attribute's entry
//! - [`converters`] - named, composable value coercions and their registry
//! - [`validators`] - named rules, structured rules, ordered dispatch
//! - [`populate`] - default filling, recursive for structured attributes
//! - [`AttributeInfo`] - per-request stages over a [`Schema`]
//! - [`SchemaLoader`] - builds a [`SchemaSet`] from YAML or JSON documents
//! - [`RequestPipeline`] - runs the stages in order under an [`EngineConfig`]
//!
//! ## Usage
//!
//! ```ignore
//! use attrkit::{Action, ConverterRegistry, EngineConfig, RequestBody, RequestPipeline,
//!     SchemaLoader, ValidatorRegistry};
//!
//! let converters = ConverterRegistry::new();
//! let mut validators = ValidatorRegistry::new();
//! attrkit::extensions::register_all(&mut validators)?;
//!
//! let schemas = SchemaLoader::new(&converters, &validators).load_yaml(&document)?;
//! let config = EngineConfig::default();
//!
//! let mut body = RequestBody::from_json_map(request);
//! RequestPipeline::new(schemas.schema("ports")?, &config)
//!     .prepare(&ctx, &mut body, Action::Create)?;
//! ```

pub mod config;
pub mod context;
pub mod converters;
pub mod error;
pub mod extensions;
pub mod info;
pub mod loader;
pub mod pipeline;
pub mod populate;
pub mod schema;
pub mod spec;
pub mod validators;
pub mod value;

pub use config::EngineConfig;
pub use context::ProjectContext;
pub use converters::{
    BuiltinConverter, BuiltinListConverter, Converter, ConverterHandle, ConverterPipeline,
    ConverterRegistry, ListConverter, ListConverterHandle,
};
pub use error::{AttributeError, ConfigurationError, ConvertError};
pub use info::{AttributeInfo, is_attr_set};
pub use loader::SchemaLoader;
pub use pipeline::{Action, RequestPipeline};
pub use populate::{fill_default, populate_nested_defaults};
pub use schema::{AttributeMap, PROJECT_ID, ParentRef, Schema, SchemaSet, SubResource, TENANT_ID};
pub use spec::AttributeSpec;
pub use validators::{
    DictValidator, LeafValidator, NestedSpecs, NestedValidatorHandle, Rule, RuleKind,
    ValidatorHandle, ValidatorRegistry, dispatch, validate_dict,
};
pub use value::{ATTR_NOT_SPECIFIED, AttrDefault, AttrValue, RequestBody, Slots};
