//! Headers module
//!
//! This module provides a constants for HTTP headers.
//!

pub(crate) const ACCEPT: &str = "Accept";
pub(crate) const AUTHORIZATION: &str = "Authorization";
pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const USER_AGENT: &str = "User-Agent";
pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Value of the `Authorization` header for a capability token.
pub(crate) fn capability_authorization(capability: &str) -> String {
    format!("Capability {capability}")
}
