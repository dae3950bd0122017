#![allow(clippy::unwrap_used, clippy::expect_used)]

use attrkit::converters::builtin::{cidr_to_canonical, to_protocol};
use attrkit::{
    AttributeError, AttributeInfo, AttributeSpec, BuiltinConverter, ConverterPipeline,
    RequestBody, Schema,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6..1.0e6f64).prop_map(|f| json!(f)),
        "[a-zA-Z0-9_ ]{0,12}".prop_map(Value::String),
        prop::sample::select(vec![
            "TCP", "icmp", "6", "256", "yes", "No", "0", "1", " 42", "1.5", "-3",
            "10.0.0.1", "10.0.0.0/8", "2001:0DB8::1", "2001:0DB8::1/64", "::1/129",
        ])
        .prop_map(|s| Value::String(s.to_owned())),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Applying a converter to its own output changes nothing.
    #[test]
    fn builtin_converters_are_idempotent(value in json_value()) {
        for converter in BuiltinConverter::ALL {
            if let Ok(once) = converter.apply(&value) {
                let twice = converter.apply(&once);
                prop_assert_eq!(twice.as_ref().ok(), Some(&once), "{}", converter.name());
            }
        }
    }

    /// Pipelines inherit idempotence from their steps.
    #[test]
    fn pipeline_is_idempotent(value in json_value()) {
        let pipeline = ConverterPipeline::single(BuiltinConverter::NoneToEmptySequence)
            .then(BuiltinConverter::ToSequence);
        let once = pipeline.apply(&value).unwrap();
        prop_assert_eq!(pipeline.apply(&once).unwrap(), once);
    }
}

#[test]
fn protocol_boundary() {
    assert!(to_protocol(&json!(256)).is_err());
    assert_eq!(to_protocol(&json!(255)).unwrap(), json!(255));
    assert_eq!(to_protocol(&json!("TCP")).unwrap(), json!("tcp"));
    assert!(to_protocol(&json!("256")).is_err());
}

#[test]
fn protocol_error_differs_from_integer_error() {
    let err = to_protocol(&json!("bogus")).unwrap_err();
    assert!(err.message().starts_with("Protocol 'bogus' is not supported"));
    let int_err = BuiltinConverter::ToInt.apply(&json!("bogus")).unwrap_err();
    assert_ne!(err.message(), int_err.message());
}

#[test]
fn cidr_canonical_form() {
    assert_eq!(
        cidr_to_canonical(&json!("2001:0DB8::1/64")).unwrap(),
        json!("2001:db8::1/64")
    );
    assert!(cidr_to_canonical(&json!("not-a-cidr")).is_err());
}

#[test]
fn failed_conversion_is_invalid_input() {
    let schema = Schema::new("networks").attribute(
        "cidr",
        AttributeSpec::new()
            .allow_post(true)
            .convert_to(BuiltinConverter::CidrToCanonical),
    );
    let mut body = RequestBody::new();
    body.insert("cidr", json!("not-a-cidr"));

    let err = AttributeInfo::new(&schema)
        .convert_values(&mut body)
        .unwrap_err();
    assert!(matches!(err, AttributeError::InvalidInput { .. }));
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("cidr"));
}
