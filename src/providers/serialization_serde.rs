//! Serde implementation for spire.io [`Serialize`] trait.
//!
//! This module provides a `serde` serializer for request bodies.
//!
//! # Examples
//! ```
//! use spire_io::core::Serialize as _;
//!
//! #[derive(serde::Serialize)]
//! struct NewChannel<'a> {
//!    name: &'a str,
//! }
//!
//! let body = NewChannel { name: "news" }.serialize().unwrap();
//! assert_eq!(body, b"{\"name\":\"news\"}".to_vec());
//! ```
//!
//! [`Serialize`]: ../../core/trait.Serialize.html
impl<S> crate::core::Serialize for S
where
    S: serde::Serialize,
{
    fn serialize(self) -> Result<Vec<u8>, crate::core::SpireError> {
        serde_json::to_vec(&self).map_err(|e| crate::core::SpireError::Serialization {
            details: e.to_string(),
        })
    }
}
