//! DNS name validators.
//!
//! Both accept the empty string, which clears the name. The optional rule
//! parameter is the maximum total length.

use serde_json::Value;

use crate::converters::builtin::display;
use crate::error::ConfigurationError;
use crate::validators::ValidatorRegistry;

pub const DNS_HOST_NAME: &str = "type:dns_host_name";
pub const DNS_DOMAIN_NAME: &str = "type:dns_domain_name";

/// Maximum length of a fully qualified name.
pub const FQDN_MAX_LEN: usize = 255;
const LABEL_MAX_LEN: usize = 63;

/// # Errors
///
/// Returns [`ConfigurationError::DuplicateValidator`] if a name is taken.
pub fn register(registry: &mut ValidatorRegistry) -> Result<(), ConfigurationError> {
    registry.register(DNS_HOST_NAME, validate_host_name)?;
    registry.register(DNS_DOMAIN_NAME, validate_domain_name)?;
    Ok(())
}

fn max_len(param: Option<&Value>) -> usize {
    param
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(FQDN_MAX_LEN)
}

/// A host name: a relative or fully qualified DNS name.
///
/// # Errors
///
/// Returns the diagnostic for a malformed name.
pub fn validate_host_name(value: &Value, param: Option<&Value>) -> Result<(), String> {
    let Some(name) = value.as_str() else {
        return Err(format!("'{}' is not a valid string", display(value)));
    };
    if name.is_empty() {
        return Ok(());
    }
    check_format(name, max_len(param))
}

/// A domain name: must be fully qualified, i.e. end with a dot.
///
/// # Errors
///
/// Returns the diagnostic for a malformed or relative name.
pub fn validate_domain_name(value: &Value, param: Option<&Value>) -> Result<(), String> {
    let Some(name) = value.as_str() else {
        return Err(format!("'{}' is not a valid string", display(value)));
    };
    if name.is_empty() {
        return Ok(());
    }
    check_format(name, max_len(param))?;
    if !name.ends_with('.') {
        return Err(format!("'{name}' is not a FQDN"));
    }
    Ok(())
}

fn check_format(name: &str, max_len: usize) -> Result<(), String> {
    if name.len() > max_len {
        return Err(format!("'{name}' exceeds the {max_len} character FQDN limit"));
    }
    let relative = name.strip_suffix('.').unwrap_or(name);
    let labels: Vec<&str> = relative.split('.').collect();
    for label in &labels {
        check_label(name, label)?;
    }
    if let [_, .., tld] = labels.as_slice()
        && tld.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(format!("'{name}' TLD '{tld}' must not be all numeric"));
    }
    Ok(())
}

fn invalid_name(name: &str, reason: &str) -> String {
    format!("'{name}' not a valid PQDN or FQDN. Reason: {reason}")
}

fn check_label(name: &str, label: &str) -> Result<(), String> {
    if label.is_empty() {
        return Err(invalid_name(name, "Encountered an empty component"));
    }
    if label.len() > LABEL_MAX_LEN {
        return Err(invalid_name(
            name,
            &format!("'{label}' exceeds {LABEL_MAX_LEN} characters"),
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(invalid_name(
            name,
            &format!("'{label}' cannot start or end with a hyphen"),
        ));
    }
    if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(invalid_name(
            name,
            &format!("'{label}' contains invalid characters"),
        ));
    }
    Ok(())
}
