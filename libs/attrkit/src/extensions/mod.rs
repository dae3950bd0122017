//! Collaborator validators and helpers built on the public registration
//! contract, the same way third-party extensions plug into the engine.

pub mod bfd;
pub mod dns;
pub mod multiprovider;

use crate::error::ConfigurationError;
use crate::validators::ValidatorRegistry;

/// Register every bundled extension validator.
///
/// # Errors
///
/// Returns [`ConfigurationError::DuplicateValidator`] if any name is taken.
pub fn register_all(registry: &mut ValidatorRegistry) -> Result<(), ConfigurationError> {
    dns::register(registry)?;
    bfd::register(registry)?;
    Ok(())
}
