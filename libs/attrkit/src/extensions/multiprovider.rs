//! Provider network segments.
//!
//! A multi-segment network carries a list of segment mappings. Each segment
//! is prepared like a small resource of its own: unknown keys are rejected,
//! defaults filled, values converted and validated.

use serde_json::{Value, json};

use crate::converters::BuiltinConverter;
use crate::converters::builtin::display;
use crate::error::AttributeError;
use crate::info::AttributeInfo;
use crate::schema::Schema;
use crate::spec::AttributeSpec;
use crate::validators::{LeafValidator, Rule};
use crate::value::RequestBody;

pub const NETWORK_TYPE: &str = "provider:network_type";
pub const PHYSICAL_NETWORK: &str = "provider:physical_network";
pub const SEGMENTATION_ID: &str = "provider:segmentation_id";

/// The standard segment layout: all three keys optional.
#[must_use]
pub fn segment_schema() -> Schema {
    Schema::new("segments")
        .attribute(
            NETWORK_TYPE,
            AttributeSpec::new()
                .allow_post(true)
                .default_not_specified()
                .rule(Rule::leaf(LeafValidator::StringOrNone, Some(json!(255)))),
        )
        .attribute(
            PHYSICAL_NETWORK,
            AttributeSpec::new()
                .allow_post(true)
                .default_not_specified()
                .rule(Rule::leaf(LeafValidator::StringOrNone, Some(json!(64)))),
        )
        .attribute(
            SEGMENTATION_ID,
            AttributeSpec::new()
                .allow_post(true)
                .default_not_specified()
                .default_overrides_none(true)
                .convert_to(BuiltinConverter::ToInt)
                .rule(Rule::leaf(LeafValidator::NonNegative, None)),
        )
}

/// Prepare every segment in `segments` against `schema`.
///
/// # Errors
///
/// Returns [`AttributeError::InvalidInput`] for a segment that is not a
/// mapping or whose values fail conversion or validation, and
/// [`AttributeError::BadRequest`] for unknown segment keys.
pub fn convert_and_validate_segments(
    segments: &[Value],
    schema: &Schema,
) -> Result<Vec<RequestBody>, AttributeError> {
    let info = AttributeInfo::new(schema);
    segments
        .iter()
        .map(|segment| {
            let Value::Object(map) = segment else {
                return Err(AttributeError::invalid_input(format!(
                    "Invalid input for segments. Reason: '{}' is not a dictionary.",
                    display(segment)
                )));
            };
            let mut body = RequestBody::from_json_map(map.clone());
            info.verify_attributes(&body)?;
            info.fill_post_defaults(&mut body, true)?;
            info.convert_values(&mut body)?;
            Ok(body)
        })
        .collect()
}
