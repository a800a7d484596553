//! # Reqwest Transport Implementation
//!
//! This module contains the [`TransportReqwest`] struct.
//! It is used to send requests to the [`spire.io API`] using the [`reqwest`] crate.
//! It is intended to be used by the [`spire_io`] crate.
//!
//! It requires the [`reqwest` feature] to be enabled.
//!
//! [`TransportReqwest`]: ./struct.TransportReqwest.html
//! [`spire.io API`]: https://www.spire.io/docs
//! [`reqwest`]: https://docs.rs/reqwest
//! [`spire_io`]: ../index.html
//! [`reqwest` feature]: ../index.html#features

use crate::{
    core::{
        utils::encoding::url_encode, SpireError, Transport, TransportMethod, TransportRequest,
        TransportResponse,
    },
    SpireClientBuilder, SpireClientRuntimeBuilder,
};
use bytes::Bytes;
use log::debug;
use reqwest::{header::HeaderMap, StatusCode};
use std::{collections::HashMap, time::Duration};

/// This struct is used to send requests to the [`spire.io API`] using the [`reqwest`] crate.
/// It is used as the transport type for the [`SpireClient`].
///
/// spire.io hands out absolute resource URLs, so unlike other transports this
/// one has no hostname to configure.
///
/// [`spire.io API`]: https://www.spire.io/docs
/// [`reqwest`]: https://docs.rs/reqwest
/// [`SpireClient`]: ../dx/spire_client/type.SpireClient.html
#[derive(Clone, Debug, Default)]
pub struct TransportReqwest {
    reqwest_client: reqwest::Client,
}

#[async_trait::async_trait]
impl Transport for TransportReqwest {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, SpireError> {
        let request_url = prepare_url(&request.url, &request.query_parameters);
        debug!("{} {}", request.method, request_url);
        let headers = prepare_headers(&request.headers)?;
        let mut builder = match request.method {
            TransportMethod::Get => self.reqwest_client.get(request_url),
            TransportMethod::Post => self.reqwest_client.post(request_url),
            TransportMethod::Put => self.reqwest_client.put(request_url),
            TransportMethod::Delete => self.reqwest_client.delete(request_url),
        };

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if request.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(request.timeout));
        }

        let result = builder
            .headers(headers)
            .send()
            .await
            .map_err(|e| SpireError::Transport {
                details: e.to_string(),
            })?;

        let status = result.status();
        let response_headers = collect_headers(result.headers());
        result
            .bytes()
            .await
            .map_err(|e| SpireError::Transport {
                details: e.to_string(),
            })
            .map(|bytes| create_result(status, response_headers, bytes))
    }
}

impl TransportReqwest {
    /// Create a new [`TransportReqwest`] instance.
    ///
    /// It provides a default [`reqwest`] client using [`reqwest::Client::default()`].
    ///
    /// # Example
    /// ```
    /// use spire_io::transport::TransportReqwest;
    ///
    /// let transport = TransportReqwest::new();
    /// ```
    ///
    /// [`TransportReqwest`]: ./struct.TransportReqwest.html
    /// [`reqwest`]: https://docs.rs/reqwest
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`TransportReqwest`] on top of a preconfigured
    /// [`reqwest::Client`] (proxies, TLS roots and so on).
    pub fn with_client(reqwest_client: reqwest::Client) -> Self {
        Self { reqwest_client }
    }
}

fn prepare_headers(request_headers: &HashMap<String, String>) -> Result<HeaderMap, SpireError> {
    HeaderMap::try_from(request_headers).map_err(|err| SpireError::Transport {
        details: err.to_string(),
    })
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect()
}

fn prepare_url(url: &str, query_params: &HashMap<String, String>) -> String {
    if query_params.is_empty() {
        return url.to_string();
    }

    let mut pairs = query_params.iter().collect::<Vec<_>>();
    pairs.sort();

    let query = pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", url_encode(k.as_bytes()), url_encode(v.as_bytes())))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };

    format!("{url}{separator}{query}")
}

fn create_result(
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Bytes,
) -> TransportResponse {
    TransportResponse {
        status: status.as_u16(),
        headers,
        body: (!body.is_empty()).then(|| body.to_vec()),
    }
}

impl SpireClientBuilder {
    /// Creates a new [`SpireClientRuntimeBuilder`] with the default [`TransportReqwest`] transport.
    /// The default transport uses the [`reqwest`] crate to send requests to the [`spire.io API`].
    ///
    /// # Examples
    /// ```
    /// use spire_io::SpireClientBuilder;
    ///
    /// # fn main() -> Result<(), spire_io::core::SpireError> {
    /// let client = SpireClientBuilder::with_reqwest_transport()
    ///     .with_default_url()
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// [`SpireClientRuntimeBuilder`]: ../dx/spire_client/struct.SpireClientRuntimeBuilder.html
    /// [`TransportReqwest`]: ./struct.TransportReqwest.html
    /// [`reqwest`]: https://docs.rs/reqwest
    /// [`spire.io API`]: https://www.spire.io/docs
    pub fn with_reqwest_transport() -> SpireClientRuntimeBuilder<TransportReqwest> {
        SpireClientBuilder::with_transport(TransportReqwest::new())
    }
}
