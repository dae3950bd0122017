//! Default filling, including recursion into structured attributes.

use serde_json::{Map, Value};

use crate::spec::AttributeSpec;
use crate::validators::NestedSpecs;
use crate::value::{AttrValue, Slots};

/// Fill `key` from `spec.default`.
///
/// The key is only filled when it is absent (or holds the "not specified"
/// marker). A present value is never overwritten, even a falsy one, except
/// that an explicit `null` is replaced when `default_overrides_none` is set.
/// A spec without a default leaves the container untouched.
pub fn fill_default<S: Slots + ?Sized>(container: &mut S, key: &str, spec: &AttributeSpec) {
    let Some(default) = &spec.default else {
        return;
    };
    let current = container.slot(key);
    let replace = match current {
        AttrValue::NotSpecified => true,
        AttrValue::ExplicitNull => spec.default_overrides_none,
        AttrValue::Specified(_) => false,
    };
    if replace {
        tracing::debug!(attribute = key, "filling default");
        container.set_slot(key, default.to_attr_value());
    }
}

/// Populate nested defaults of a structured attribute.
///
/// Only specs that opt in with `dict_populate_defaults` are populated; any
/// other value is returned as is. With the opt-in, an absent value becomes an
/// empty mapping first. Values that are not mappings are returned unchanged
/// for validation to reject later.
#[must_use]
pub fn populate_nested_defaults(value: AttrValue, spec: &AttributeSpec) -> AttrValue {
    populate_with(
        value,
        spec.dict_populate_defaults,
        spec.structured_rules().map(|(_, specs)| specs),
    )
}

fn populate_with<'a>(
    value: AttrValue,
    dict_populate_defaults: bool,
    structured: impl Iterator<Item = &'a NestedSpecs>,
) -> AttrValue {
    if !dict_populate_defaults {
        return value;
    }
    let mut map = match value {
        AttrValue::NotSpecified => Map::new(),
        AttrValue::Specified(Value::Object(map)) => map,
        other => return other,
    };

    for nested in structured {
        for (key, key_spec) in nested {
            if let Some(inner) = key_spec.structured_rules().map(|(_, s)| s).next() {
                let mut current = map.slot(key);
                if key_spec.default_overrides_none && current.is_null() {
                    current = AttrValue::NotSpecified;
                }
                let populated = populate_with(
                    current,
                    key_spec.dict_populate_defaults,
                    std::iter::once(inner),
                );
                if let AttrValue::Specified(obj @ Value::Object(_)) = populated {
                    map.insert(key.clone(), obj);
                }
            }
            fill_default(&mut map, key, key_spec);
        }
    }

    AttrValue::Specified(Value::Object(map))
}
