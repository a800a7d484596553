//! Serialization module
//!
//! This module provides a [`Serialize`] trait used to build request bodies.
//!
//! An implementation for every [`serde::Serialize`] type lives in
//! [`providers::serialization_serde`].
//!
//! [`Serialize`]: trait.Serialize.html
//! [`providers::serialization_serde`]: ../../providers/serialization_serde/index.html

use super::SpireError;

/// Serialize values
///
/// This trait provides a [`serialize`] method used for request bodies sent to
/// the spire.io API.
///
/// [`serialize`]: #tymethod.serialize
pub trait Serialize {
    /// Serialize the value
    ///
    /// # Errors
    /// Should return an [`SpireError::Serialization`] if the value cannot be serialized.
    ///
    /// [`SpireError::Serialization`]: ../error/enum.SpireError.html#variant.Serialization
    fn serialize(self) -> Result<Vec<u8>, SpireError>;
}
