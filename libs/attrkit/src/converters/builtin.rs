//! Built-in converter bodies.
//!
//! Every function here is idempotent on its own output.

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde_json::{Map, Number, Value};

use crate::error::ConvertError;

/// Single-element input to [`kvp_list_to_mapping`] that denotes a bare
/// boolean flag passed from a command line client.
pub const KVP_FLAG_SENTINEL: &str = "True";

/// Protocol names accepted by [`to_protocol`].
pub const PROTOCOL_NAMES: &[&str] = &[
    "ah",
    "dccp",
    "egp",
    "esp",
    "gre",
    "hopopt",
    "icmp",
    "icmpv6",
    "igmp",
    "ipip",
    "ipv6-encap",
    "ipv6-frag",
    "ipv6-icmp",
    "ipv6-nonxt",
    "ipv6-opts",
    "ipv6-route",
    "ospf",
    "pgm",
    "rsvp",
    "sctp",
    "tcp",
    "udp",
    "udplite",
    "vrrp",
];

const MAX_PROTOCOL_NUMBER: i64 = 255;

/// Render a value for inclusion in a diagnostic.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strict boolean coercion.
///
/// # Errors
///
/// Returns [`ConvertError`] for anything other than a boolean, one of the
/// accepted strings, or the integers `0`/`1`.
pub fn to_boolean(value: &Value) -> Result<Value, ConvertError> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.map(Value::Bool).ok_or_else(|| {
        ConvertError::new(format!(
            "'{}' cannot be converted to boolean",
            display(value)
        ))
    })
}

/// # Errors
///
/// Same as [`to_boolean`] for non-null input.
pub fn to_boolean_or_none(value: &Value) -> Result<Value, ConvertError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    to_boolean(value)
}

/// # Errors
///
/// Returns [`ConvertError`] for non-numeric input and for numbers with a
/// fractional part.
pub fn to_int(value: &Value) -> Result<Value, ConvertError> {
    let not_int = || ConvertError::new(format!("'{}' is not an integer", display(value)));
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => {
            let f = n.as_f64().ok_or_else(not_int)?;
            if f.fract() != 0.0 || !f.is_finite() {
                return Err(not_int());
            }
            format!("{f:.0}")
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| not_int())
        }
        Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| not_int()),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(not_int()),
    }
}

/// # Errors
///
/// Returns [`ConvertError`] for unparsable input and, with a different
/// message, for negative numbers.
pub fn to_positive_float_or_none(value: &Value) -> Result<Value, ConvertError> {
    let parsed = match value {
        Value::Null => return Ok(Value::Null),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };
    let Some(f) = parsed.filter(|f| f.is_finite()) else {
        return Err(ConvertError::new(format!(
            "'{}' cannot be converted to float",
            display(value)
        )));
    };
    if f < 0.0 {
        return Err(ConvertError::new(format!(
            "'{}' must be a non negative decimal",
            display(value)
        )));
    }
    Number::from_f64(f).map(Value::Number).ok_or_else(|| {
        ConvertError::new(format!(
            "'{}' cannot be converted to float",
            display(value)
        ))
    })
}

/// Split `key=value` on the first `=`.
///
/// # Errors
///
/// Returns [`ConvertError`] when there is no `=` or the key is empty.
pub fn kvp_string_to_pair(s: &str) -> Result<(String, String), ConvertError> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(ConvertError::new(format!(
            "'{s}' is not of the form <key>=[value]"
        ))),
    }
}

/// Collapse repeated `key=value` strings into `key -> [values]`.
///
/// Value lists are de-duplicated and sorted so the result is stable.
///
/// # Errors
///
/// Returns [`ConvertError`] if an element is not a string or is not a valid
/// key/value pair.
pub fn kvp_list_to_mapping(items: &[Value]) -> Result<Value, ConvertError> {
    if let [Value::String(only)] = items
        && only == KVP_FLAG_SENTINEL
    {
        return Ok(Value::Object(Map::new()));
    }

    let mut collected: std::collections::BTreeMap<String, BTreeSet<String>> =
        std::collections::BTreeMap::new();
    for item in items {
        let Value::String(s) = item else {
            return Err(ConvertError::new(format!(
                "'{}' is not of the form <key>=[value]",
                display(item)
            )));
        };
        let (key, value) = kvp_string_to_pair(s)?;
        collected.entry(key).or_default().insert(value);
    }

    Ok(Value::Object(
        collected
            .into_iter()
            .map(|(k, vs)| (k, Value::Array(vs.into_iter().map(Value::String).collect())))
            .collect(),
    ))
}

/// # Errors
///
/// Never fails; the signature matches the converter contract.
#[allow(clippy::unnecessary_wraps)]
pub fn none_to_empty_sequence(value: &Value) -> Result<Value, ConvertError> {
    Ok(if value.is_null() {
        Value::Array(Vec::new())
    } else {
        value.clone()
    })
}

/// # Errors
///
/// Never fails; the signature matches the converter contract.
#[allow(clippy::unnecessary_wraps)]
pub fn none_to_empty_mapping(value: &Value) -> Result<Value, ConvertError> {
    Ok(if value.is_null() {
        Value::Object(Map::new())
    } else {
        value.clone()
    })
}

/// Coerce any value to a sequence.
#[must_use]
pub fn to_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.keys().cloned().map(Value::String).collect(),
        scalar @ (Value::Bool(_) | Value::Number(_) | Value::String(_)) => vec![scalar.clone()],
    }
}

/// # Errors
///
/// Never fails; the signature matches the converter contract.
#[allow(clippy::unnecessary_wraps)]
pub fn to_sequence_value(value: &Value) -> Result<Value, ConvertError> {
    Ok(Value::Array(to_sequence(value)))
}

/// Rewrite IPv6 addresses to RFC 5952 form; everything else is untouched.
///
/// # Errors
///
/// Never fails; non-IP input passes through.
#[allow(clippy::unnecessary_wraps)]
pub fn ip_to_canonical(value: &Value) -> Result<Value, ConvertError> {
    if let Value::String(s) = value
        && let Ok(IpAddr::V6(v6)) = s.parse::<IpAddr>()
    {
        return Ok(Value::String(v6.to_string()));
    }
    Ok(value.clone())
}

/// Parse `address[/prefix]` into its address and prefix length.
///
/// A missing prefix means a host route.
pub(crate) fn parse_cidr(s: &str) -> Option<(IpAddr, u8)> {
    let (addr, prefix) = match s.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (s, None),
    };
    let ip: IpAddr = addr.parse().ok()?;
    let max = if ip.is_ipv4() { 32 } else { 128 };
    let prefix = match prefix {
        Some(p) => p.parse::<u8>().ok().filter(|p| *p <= max)?,
        None => max,
    };
    Some((ip, prefix))
}

/// Canonicalize `address/prefix`, keeping host bits.
///
/// # Errors
///
/// Returns [`ConvertError`] if the value is not a valid IP network.
pub fn cidr_to_canonical(value: &Value) -> Result<Value, ConvertError> {
    let invalid = || ConvertError::new(format!("'{}' is not a valid IP subnet", display(value)));
    let Value::String(s) = value else {
        return Err(invalid());
    };
    let (ip, prefix) = parse_cidr(s).ok_or_else(invalid)?;
    Ok(Value::String(format!("{ip}/{prefix}")))
}

/// # Errors
///
/// Returns [`ConvertError`] for unknown protocol names, integers outside
/// `0..=255`, and non-string non-integer input.
pub fn to_protocol(value: &Value) -> Result<Value, ConvertError> {
    let unsupported = || {
        ConvertError::new(format!(
            "Protocol '{}' is not supported. Only protocol names and their integer \
             representation (0 to 255) are supported",
            display(value)
        ))
    };
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => {
            let lowered = s.to_ascii_lowercase();
            if PROTOCOL_NAMES.contains(&lowered.as_str()) {
                return Ok(Value::String(lowered));
            }
            let n = s.trim().parse::<i64>().map_err(|_| unsupported())?;
            if (0..=MAX_PROTOCOL_NUMBER).contains(&n) {
                Ok(Value::String(n.to_string()))
            } else {
                Err(unsupported())
            }
        }
        Value::Number(n) => match n.as_i64() {
            Some(n) if (0..=MAX_PROTOCOL_NUMBER).contains(&n) => Ok(value.clone()),
            _ => Err(unsupported()),
        },
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(unsupported()),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn to_boolean_accepts_documented_forms() {
        for (input, expected) in [
            (json!("TRUE"), true),
            (json!("yes"), true),
            (json!("1"), true),
            (json!(1), true),
            (json!(true), true),
            (json!("False"), false),
            (json!("NO"), false),
            (json!("0"), false),
            (json!(0), false),
        ] {
            assert_eq!(to_boolean(&input).unwrap(), json!(expected), "{input}");
        }
    }

    #[test]
    fn to_boolean_is_strict() {
        for input in [json!("on"), json!(2), json!(""), json!(null), json!([true])] {
            assert!(to_boolean(&input).is_err(), "{input}");
        }
        assert_eq!(to_boolean_or_none(&json!(null)).unwrap(), json!(null));
    }

    #[test]
    fn to_int_rejects_fractions() {
        assert_eq!(to_int(&json!("42")).unwrap(), json!(42));
        assert_eq!(to_int(&json!(7)).unwrap(), json!(7));
        assert_eq!(to_int(&json!(3.0)).unwrap(), json!(3));
        assert!(to_int(&json!(3.5)).is_err());
        assert!(to_int(&json!("3.5")).is_err());
        assert!(to_int(&json!("abc")).is_err());
        assert!(to_int(&json!(true)).is_err());
    }

    #[test]
    fn positive_float_distinguishes_negative_from_garbage() {
        assert_eq!(to_positive_float_or_none(&json!(null)).unwrap(), json!(null));
        assert_eq!(to_positive_float_or_none(&json!("1.5")).unwrap(), json!(1.5));
        let negative = to_positive_float_or_none(&json!(-1)).unwrap_err();
        let garbage = to_positive_float_or_none(&json!("x")).unwrap_err();
        assert!(negative.message().contains("non negative"));
        assert!(garbage.message().contains("cannot be converted"));
    }

    #[test]
    fn kvp_pair_splits_on_first_equals() {
        assert_eq!(
            kvp_string_to_pair("a=b=c").unwrap(),
            ("a".to_owned(), "b=c".to_owned())
        );
        assert_eq!(
            kvp_string_to_pair("a=").unwrap(),
            ("a".to_owned(), String::new())
        );
        assert!(kvp_string_to_pair("=b").is_err());
        assert!(kvp_string_to_pair("ab").is_err());
    }

    #[test]
    fn kvp_list_collects_value_sets() {
        let out = kvp_list_to_mapping(&[json!("a=1"), json!("a=2"), json!("a=1"), json!("b=x")])
            .unwrap();
        assert_eq!(out, json!({"a": ["1", "2"], "b": ["x"]}));
        assert_eq!(kvp_list_to_mapping(&[json!("True")]).unwrap(), json!({}));
        assert!(kvp_list_to_mapping(&[json!("noequals")]).is_err());
    }

    #[test]
    fn to_sequence_shapes() {
        assert_eq!(to_sequence(&json!(null)), Vec::<Value>::new());
        assert_eq!(to_sequence(&json!("abc")), vec![json!("abc")]);
        assert_eq!(to_sequence(&json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(to_sequence(&json!({"k": 1})), vec![json!("k")]);
    }

    #[test]
    fn ip_canonical_form() {
        assert_eq!(
            ip_to_canonical(&json!("2001:0DB8:0000::0001")).unwrap(),
            json!("2001:db8::1")
        );
        assert_eq!(ip_to_canonical(&json!("10.0.0.1")).unwrap(), json!("10.0.0.1"));
        assert_eq!(ip_to_canonical(&json!("not-an-ip")).unwrap(), json!("not-an-ip"));
        assert_eq!(ip_to_canonical(&json!(5)).unwrap(), json!(5));
    }

    #[test]
    fn cidr_canonical_form() {
        assert_eq!(
            cidr_to_canonical(&json!("2001:0DB8::1/64")).unwrap(),
            json!("2001:db8::1/64")
        );
        assert_eq!(
            cidr_to_canonical(&json!("10.0.0.0/8")).unwrap(),
            json!("10.0.0.0/8")
        );
        assert_eq!(
            cidr_to_canonical(&json!("10.0.0.1")).unwrap(),
            json!("10.0.0.1/32")
        );
        assert!(cidr_to_canonical(&json!("not-a-cidr")).is_err());
        assert!(cidr_to_canonical(&json!("10.0.0.0/33")).is_err());
        assert!(cidr_to_canonical(&json!(10)).is_err());
    }

    #[test]
    fn protocol_boundaries() {
        assert_eq!(to_protocol(&json!("TCP")).unwrap(), json!("tcp"));
        assert_eq!(to_protocol(&json!(255)).unwrap(), json!(255));
        assert_eq!(to_protocol(&json!("6")).unwrap(), json!("6"));
        assert_eq!(to_protocol(&json!(null)).unwrap(), json!(null));
        let err = to_protocol(&json!(256)).unwrap_err();
        assert!(err.message().starts_with("Protocol '256' is not supported"));
        assert!(to_protocol(&json!("bogus")).is_err());
        assert!(to_protocol(&json!(-1)).is_err());
    }
}
