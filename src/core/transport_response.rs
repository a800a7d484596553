//! This module contains the `TransportResponse` struct.
//!
//! This struct is used to represent the response from a request to the [`spire.io API`].
//! It is used as the response type for the [`Transport`] trait.
//!
//! [`Transport`]: ../transport/trait.Transport.html
//! [`spire.io API`]: https://www.spire.io/docs

use std::collections::HashMap;

/// This struct is used to represent the response from a request to the [`spire.io API`].
/// It is used as the response type for the [`Transport`] trait.
///
/// [`Transport`]: ../transport/trait.Transport.html
/// [`spire.io API`]: https://www.spire.io/docs
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TransportResponse {
    /// status code of the response
    pub status: u16,

    /// headers of the response
    pub headers: HashMap<String, String>,

    /// body of the response
    pub body: Option<Vec<u8>>,
}

impl TransportResponse {
    /// Response body as text.
    ///
    /// Used to attach the body to errors; invalid UTF-8 is replaced.
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default()
    }
}
