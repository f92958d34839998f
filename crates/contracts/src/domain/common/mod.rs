//! Common types shared by all aggregates

pub mod identifier;
pub mod validation;

// Re-exports
pub use identifier::{Identifier, InvalidFormat};
pub use validation::{FieldError, ValidationError};
