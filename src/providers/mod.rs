//! # Providers module
//!
//! This module contains the Providers that can be used by [`SpireClient`].
//! It is intended to be used by the [`spire_io`] crate.
//!
//! [`SpireClient`]: ../dx/spire_client/type.SpireClient.html
//! [`spire_io`]: ../index.html

pub mod serialization_serde;

pub mod deserialization_serde;

#[cfg(feature = "tokio")]
pub mod futures_tokio;
