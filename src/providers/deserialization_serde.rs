//! Serde implementation for spire.io [`Deserializer`] trait.
//!
//! This module provides a `serde` deserializer for spire.io API responses.
//!
//! # Examples
//! ```
//! use spire_io::core::Deserializer as _;
//! use spire_io::providers::deserialization_serde::DeserializerSerde;
//!
//! #[derive(serde::Deserialize, Debug, PartialEq)]
//! struct Channel {
//!    name: String,
//! }
//!
//! let channel: Channel = DeserializerSerde.deserialize(b"{\"name\":\"news\"}").unwrap();
//! assert_eq!(channel, Channel { name: "news".to_string() });
//! ```
//!
//! [`Deserializer`]: ../../core/trait.Deserializer.html

use crate::core::{Deserializer, SpireError};

/// Serde implementation for spire.io [`Deserializer`] trait.
///
/// This struct implements the [`Deserializer`] trait for the [`serde`] crate.
/// It is used by the [`dx`] modules to deserialize the data returned by the
/// spire.io API.
///
/// [`Deserializer`]: ../../core/trait.Deserializer.html
/// [`serde`]: https://crates.io/crates/serde
/// [`dx`]: ../../dx/index.html
#[derive(Debug, Clone, Default)]
pub struct DeserializerSerde;

impl Deserializer for DeserializerSerde {
    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, SpireError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        serde_json::from_slice(bytes).map_err(|e| SpireError::Deserialization {
            details: e.to_string(),
        })
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Published {
        timestamp: u64,
        content: String,
    }

    #[test]
    fn deserialize_response_body() {
        let result: Published = DeserializerSerde
            .deserialize(b"{\"timestamp\":3,\"content\":\"Message 1\"}")
            .unwrap();

        assert_eq!(
            result,
            Published {
                timestamp: 3,
                content: "Message 1".into()
            }
        );
    }

    #[test]
    fn report_malformed_payload() {
        let result: Result<Published, _> = DeserializerSerde.deserialize(b"{\"timestamp\":");

        assert!(matches!(result, Err(SpireError::Deserialization { .. })));
    }
}
