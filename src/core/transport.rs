//! # Transport module
//!
//! This module contains the [`Transport`] trait and the [`TransportRequest`] and [`TransportResponse`] types.
//!
//! You can implement this trait for your own types, or use one of the provided
//! features to use a transport library.
//!
//! [`spire.io API`]: https://www.spire.io/docs

use super::{transport_response::TransportResponse, SpireError, TransportRequest};

/// This trait is used to send requests to the [`spire.io API`].
///
/// You can implement this trait for your own types, or use one of the provided
/// features to use a transport library.
///
/// # Examples
/// ```
/// use spire_io::core::{Transport, TransportRequest, TransportResponse, SpireError};
///
/// struct MyTransport;
///
/// #[async_trait::async_trait]
/// impl Transport for MyTransport {
///    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, SpireError> {
///         // Send your request here
///
///         Ok(TransportResponse::default())
///    }
/// }
/// ```
///
/// [`spire.io API`]: https://www.spire.io/docs
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to the [`spire.io API`].
    ///
    /// Any HTTP status (including non-2xx) is a successful send. Interpreting
    /// the status is up to the caller.
    ///
    /// # Errors
    /// Should return an [`SpireError::Transport`] if the request cannot be sent.
    ///
    /// [`spire.io API`]: https://www.spire.io/docs
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, SpireError>;
}
