//! Deserialization of Rust data structures.
//!
//! This module contains the `Deserializer` trait which is used to implement
//! deserialization of Rust data structures.

use super::SpireError;

/// Trait for deserializing Rust data structures.
///
/// This trait is used to implement deserialization of Rust data structures.
/// It is used by the [`dx`] modules to deserialize the API description,
/// resources and event batches returned by the spire.io API.
///
/// # Examples
/// ```
/// use spire_io::core::{Deserializer, SpireError};
///
/// struct MyDeserializer;
///
/// impl Deserializer for MyDeserializer {
///    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, SpireError>
///    where
///        T: for<'de> serde::Deserialize<'de>,
///    {
///         // ...
///         # unimplemented!()
///    }
/// }
/// ```
///
/// [`dx`]: ../dx/index.html
pub trait Deserializer: Send + Sync {
    /// Deserialize a `&[u8]` into a `Result<T, SpireError>`.
    ///
    /// # Errors
    /// Should return [`SpireError::Deserialization`] when `bytes` can't be
    /// turned into `T`.
    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, SpireError>
    where
        T: for<'de> serde::Deserialize<'de>;
}
