//! # Core module
//!
//! The core module contains the transport-agnostic building blocks of the
//! [`spire_io`] crate: error type, transport seam, runtime seam and codec
//! seams.
//!
//! [`spire_io`]: ../index.html

#[doc(inline)]
pub use error::SpireError;
pub mod error;

#[doc(inline)]
pub use transport::Transport;
pub mod transport;

#[doc(inline)]
pub use transport_request::{TransportMethod, TransportRequest};
pub mod transport_request;

#[doc(inline)]
pub use transport_response::TransportResponse;
pub mod transport_response;

#[doc(inline)]
pub use runtime::Runtime;
pub(crate) use runtime::RuntimeSupport;
pub mod runtime;

#[doc(inline)]
pub use deserializer::Deserializer;
pub mod deserializer;

#[doc(inline)]
pub use serialize::Serialize;
pub mod serialize;

pub(crate) mod cancel;
pub(crate) mod utils;
