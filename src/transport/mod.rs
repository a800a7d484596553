//! # Transport Providers Module
//!
//! This module contains the Transport Providers that can be used by [`SpireClient`].
//! It is intended to be used by the [`spire_io`] crate.
//!
//! [`SpireClient`]: ../dx/spire_client/type.SpireClient.html
//! [`spire_io`]: ../index.html

#[cfg(feature = "reqwest")]
pub use self::reqwest::TransportReqwest;
#[cfg(feature = "reqwest")]
pub mod reqwest;

pub use middleware::SpireMiddleware;
pub mod middleware;
