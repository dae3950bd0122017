//! Error kinds produced by the attribute schema engine.

use thiserror::Error;

/// Schema-load and registration failures.
///
/// These are programming/configuration errors: they surface once, when a
/// registry or schema is built, and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Validator '{name}' does not exist")]
    UnknownValidator { name: String },

    #[error("Validator '{name}' is already registered")]
    DuplicateValidator { name: String },

    #[error("Converter '{name}' does not exist")]
    UnknownConverter { name: String },

    #[error("Converter '{name}' is already registered")]
    DuplicateConverter { name: String },

    #[error("invalid parameter for rule '{rule}' on attribute '{attribute}': {reason}")]
    InvalidRuleParam {
        attribute: String,
        rule: String,
        reason: String,
    },

    #[error("unknown resource '{resource}'")]
    UnknownResource { resource: String },

    #[error("malformed schema document: {0}")]
    Document(String),
}

/// A value could not be coerced to its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConvertError(pub String);

impl ConvertError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Failure of one request-processing stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// A value failed conversion or validation, or an attribute is not
    /// permitted for the requested verb.
    #[error("{message}")]
    InvalidInput { message: String },

    /// Ownership or closed-world violation.
    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl AttributeError {
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// True for errors caused by the request rather than the deployment.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::BadRequest { .. })
    }

    /// HTTP status class a transport layer should use for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }
}

impl From<ConvertError> for AttributeError {
    fn from(e: ConvertError) -> Self {
        Self::InvalidInput { message: e.0 }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn convert_error_lifts_to_invalid_input() {
        let err: AttributeError = ConvertError::new("'x' is not a boolean").into();
        assert_eq!(err, AttributeError::invalid_input("'x' is not a boolean"));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn configuration_errors_are_not_client_errors() {
        let err: AttributeError = ConfigurationError::UnknownValidator {
            name: "type:nope".to_owned(),
        }
        .into();
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Validator 'type:nope' does not exist");
    }
}
