//! BFD monitor validators.

use serde_json::Value;

use crate::converters::builtin::display;
use crate::error::ConfigurationError;
use crate::validators::ValidatorRegistry;

pub const BFD_MODE: &str = "type:bfd_mode";
pub const BFD_INTERVAL: &str = "type:bfd_interval";

/// Session modes a monitor may run in.
pub const BFD_MODES: &[&str] = &["asynchronous", "demand", "one_arm_echo"];

/// # Errors
///
/// Returns [`ConfigurationError::DuplicateValidator`] if a name is taken.
pub fn register(registry: &mut ValidatorRegistry) -> Result<(), ConfigurationError> {
    registry.register(BFD_MODE, |value, _| validate_mode(value))?;
    registry.register(BFD_INTERVAL, validate_interval)?;
    Ok(())
}

/// # Errors
///
/// Returns the diagnostic for a mode outside [`BFD_MODES`].
pub fn validate_mode(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(mode) if BFD_MODES.contains(&mode) => Ok(()),
        _ => Err(format!(
            "'{}' is not a valid BFD mode, expected one of [{}]",
            display(value),
            BFD_MODES.join(", ")
        )),
    }
}

/// Interval in milliseconds; the optional parameter is an upper bound.
///
/// # Errors
///
/// Returns the diagnostic for negative, non-integer, or too large values.
pub fn validate_interval(value: &Value, param: Option<&Value>) -> Result<(), String> {
    let Some(ms) = value.as_u64() else {
        return Err(format!(
            "'{}' is not a valid BFD interval in milliseconds",
            display(value)
        ));
    };
    if let Some(max) = param.and_then(Value::as_u64)
        && ms > max
    {
        return Err(format!("'{ms}' is too large - must be no larger than '{max}'"));
    }
    Ok(())
}
