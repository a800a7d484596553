//! # Error types
//!
//! This module contains the error types for the [`spire_io`] crate.
//!
//! [`spire_io`]: ../index.html

use snafu::Snafu;

/// spire.io error type
///
/// This type is used to represent errors that can occur while talking to the
/// [`spire.io API`] or while managing local subscription state.
/// It is used as the error type for the [`Result`] type.
///
/// # Examples
/// ```
/// use spire_io::core::SpireError;
///
/// fn foo() -> Result<(), SpireError> {
///   Ok(())
/// }
///
/// foo().map_err(|e| match e {
///   SpireError::Transport { .. } => println!("Transport error"),
///   SpireError::Remote { status, .. } => println!("Remote error: {status}"),
///   _ => println!("Other error"),
/// });
/// ```
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
/// [`spire.io API`]: https://www.spire.io/docs
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
pub enum SpireError {
    /// this error is returned when the transport layer fails
    #[snafu(display("Transport error: {details}"))]
    Transport {
        /// docs
        details: String,
    },

    /// this error is returned when the service responds with a status code
    /// other than the one expected by the operation
    #[snafu(display("Remote error ({status}): {body}"))]
    Remote {
        /// HTTP status code of the response
        status: u16,

        /// Raw response body
        body: String,
    },

    /// this error is returned when a create operation collides with an
    /// already existing resource (HTTP 409)
    #[snafu(display("Conflict ({status}): {body}"))]
    Conflict {
        /// HTTP status code of the response
        status: u16,

        /// Raw response body
        body: String,
    },

    /// this error is returned when a caller passes an argument which can't be
    /// used
    #[snafu(display("Invalid argument: {details}"))]
    InvalidArgument {
        /// docs
        details: String,
    },

    /// this error is returned when listening is started on a subscription
    /// which is already listening
    #[snafu(display("Subscription is already listening"))]
    AlreadyListening,

    /// this error is returned when the serialization of the request fails
    #[snafu(display("Serialization error: {details}"))]
    Serialization {
        /// docs
        details: String,
    },

    /// this error is returned when the deserialization of the response fails
    #[snafu(display("Deserialization error: {details}"))]
    Deserialization {
        /// docs
        details: String,
    },

    /// this error is returned when the API description doesn't contain an
    /// entry required by the operation
    #[snafu(display("Schema error: {details}"))]
    Schema {
        /// docs
        details: String,
    },

    /// this error is returned when the initialization of client fails
    #[snafu(display("Client initialization error: {details}"))]
    ClientInitialization {
        /// docs
        details: String,
    },
}

impl SpireError {
    /// Create [`SpireError::Remote`] from response status and raw body.
    pub fn remote<S>(status: u16, body: S) -> Self
    where
        S: Into<String>,
    {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Create [`SpireError::InvalidArgument`] with provided details.
    pub fn invalid_argument<S>(details: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument {
            details: details.into(),
        }
    }

    /// Create [`SpireError::Schema`] with provided details.
    pub(crate) fn schema<S>(details: S) -> Self
    where
        S: Into<String>,
    {
        Self::Schema {
            details: details.into(),
        }
    }

    /// Whether error has been caused by a name collision on create.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// HTTP status code reported by the service (if any).
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } | Self::Conflict { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Turn a conflict into a plain remote error.
    ///
    /// Used when a conflict couldn't be resolved locally and should be
    /// reported to the caller.
    pub(crate) fn into_remote(self) -> Self {
        match self {
            Self::Conflict { status, body } => Self::Remote { status, body },
            other => other,
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn report_status_for_service_errors() {
        assert_eq!(SpireError::remote(404, "missing").status(), Some(404));
        assert_eq!(
            SpireError::Conflict {
                status: 409,
                body: "".into()
            }
            .status(),
            Some(409)
        );
        assert_eq!(SpireError::AlreadyListening.status(), None);
    }

    #[test]
    fn convert_conflict_into_remote() {
        let error = SpireError::Conflict {
            status: 409,
            body: "exists".into(),
        };

        assert!(error.is_conflict());
        assert_eq!(error.into_remote(), SpireError::remote(409, "exists"));
    }

    #[test]
    fn display_remote_error() {
        assert_eq!(
            SpireError::remote(500, "boom").to_string(),
            "Remote error (500): boom"
        );
    }
}
