//! Built-in leaf validator bodies.
//!
//! Each function returns `Err(diagnostic)` on failure. The diagnostic is the
//! reason part of the "Invalid input for ..." message.

use std::collections::HashSet;
use std::net::IpAddr;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::converters::builtin::{display, parse_cidr};
use crate::converters::to_boolean;

pub(crate) type Diagnostic = Result<(), String>;

fn as_string(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("'{}' is not a valid string", display(value)))
}

fn as_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
    .ok_or_else(|| format!("'{}' is not an integer", display(value)))
}

fn max_len(param: Option<&Value>) -> Option<usize> {
    param
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

pub(crate) fn uuid(value: &Value) -> Diagnostic {
    match value.as_str().map(Uuid::parse_str) {
        Some(Ok(_)) => Ok(()),
        _ => Err(format!("'{}' is not a valid UUID", display(value))),
    }
}

pub(crate) fn uuid_list(value: &Value) -> Diagnostic {
    let Value::Array(items) = value else {
        return Err(format!("'{}' is not a list", display(value)));
    };
    for item in items {
        uuid(item)?;
    }
    unique(items)
}

pub(crate) fn string(value: &Value, param: Option<&Value>) -> Diagnostic {
    let s = as_string(value)?;
    if let Some(max) = max_len(param)
        && s.chars().count() > max
    {
        return Err(format!("'{s}' exceeds maximum length of {max}"));
    }
    Ok(())
}

pub(crate) fn not_empty_string(value: &Value, param: Option<&Value>) -> Diagnostic {
    string(value, param)?;
    if as_string(value)?.trim().is_empty() {
        return Err(format!(
            "'{}' Blank strings are not permitted",
            display(value)
        ));
    }
    Ok(())
}

pub(crate) fn values(value: &Value, param: Option<&Value>) -> Diagnostic {
    let allowed = param.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
    if allowed.contains(value) {
        return Ok(());
    }
    let rendered: Vec<String> = allowed.iter().map(display).collect();
    Err(format!(
        "'{}' is not in [{}]",
        display(value),
        rendered.join(", ")
    ))
}

/// `param` is `[min, max]`; `null` on either side means unbounded.
pub(crate) fn range(value: &Value, param: Option<&Value>) -> Diagnostic {
    let n = as_integer(value)?;
    let bounds = param.and_then(Value::as_array);
    let bound = |idx: usize| bounds.and_then(|b| b.get(idx)).and_then(Value::as_i64);
    if let Some(min) = bound(0)
        && n < min
    {
        return Err(format!("'{n}' is too small - must be at least '{min}'"));
    }
    if let Some(max) = bound(1)
        && n > max
    {
        return Err(format!("'{n}' is too large - must be no larger than '{max}'"));
    }
    Ok(())
}

pub(crate) fn non_negative(value: &Value) -> Diagnostic {
    if as_integer(value)? < 0 {
        return Err(format!("'{}' should be non-negative", display(value)));
    }
    Ok(())
}

pub(crate) fn boolean(value: &Value) -> Diagnostic {
    to_boolean(value)
        .map(|_| ())
        .map_err(|_| format!("'{}' is not a valid boolean value", display(value)))
}

pub(crate) fn regex(value: &Value, pattern: Option<&Regex>) -> Diagnostic {
    let invalid = || format!("'{}' is not a valid input", display(value));
    let s = value.as_str().ok_or_else(invalid)?;
    let re = pattern.ok_or_else(invalid)?;
    match re.find(s) {
        Some(m) if m.start() == 0 => Ok(()),
        _ => Err(invalid()),
    }
}

pub(crate) fn mac_address(value: &Value) -> Diagnostic {
    let invalid = || format!("'{}' is not a valid MAC address", display(value));
    let s = value.as_str().ok_or_else(invalid)?;
    let sep = if s.contains('-') { '-' } else { ':' };
    let octets: Vec<&str> = s.split(sep).collect();
    if octets.len() != 6 {
        return Err(invalid());
    }
    let mut all_zero = true;
    for octet in octets {
        if octet.len() != 2 {
            return Err(invalid());
        }
        let byte = u8::from_str_radix(octet, 16).map_err(|_| invalid())?;
        all_zero &= byte == 0;
    }
    if all_zero {
        return Err(invalid());
    }
    Ok(())
}

pub(crate) fn ip_address(value: &Value) -> Diagnostic {
    match value.as_str().map(str::parse::<IpAddr>) {
        Some(Ok(_)) => Ok(()),
        _ => Err(format!("'{}' is not a valid IP address", display(value))),
    }
}

/// Requires an explicit prefix and zero host bits.
pub(crate) fn subnet(value: &Value) -> Diagnostic {
    let not_subnet = || format!("'{}' is not a valid IP subnet", display(value));
    let s = value.as_str().ok_or_else(not_subnet)?;
    if !s.contains('/') {
        return Err(not_subnet());
    }
    let (ip, prefix) = parse_cidr(s).ok_or_else(not_subnet)?;
    let network = mask(ip, prefix);
    if network != ip {
        return Err(format!(
            "'{s}' isn't a recognized IP subnet cidr, '{network}/{prefix}' is recommended"
        ));
    }
    Ok(())
}

fn mask(ip: IpAddr, prefix: u8) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let m = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V4((bits & m).into())
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let m = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V6((bits & m).into())
        }
    }
}

fn unique(items: &[Value]) -> Diagnostic {
    let mut seen = HashSet::new();
    let dups: Vec<String> = items
        .iter()
        .map(Value::to_string)
        .filter(|rendered| !seen.insert(rendered.clone()))
        .collect();
    if dups.is_empty() {
        Ok(())
    } else {
        Err(format!("Duplicate items in the list: '{}'", dups.join(", ")))
    }
}

pub(crate) fn list_of_unique_strings(value: &Value, param: Option<&Value>) -> Diagnostic {
    let Value::Array(items) = value else {
        return Err(format!("'{}' is not a list", display(value)));
    };
    for item in items {
        string(item, param)?;
    }
    unique(items)
}
