//! # Request builders
//!
//! Every call to the spire.io API is described by a [`TransportRequest`]
//! produced by one of the functions in this module from the resource state
//! and call arguments. Builders don't perform any I/O; sending and status
//! checks are done by [`SpireClientInstance`].
//!
//! [`TransportRequest`]: ../../core/struct.TransportRequest.html
//! [`SpireClientInstance`]: ../spire_client/struct.SpireClientInstance.html

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;

use crate::{
    core::{
        utils::headers::{
            capability_authorization, ACCEPT, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE,
        },
        Deserializer, Serialize, SpireError, Transport, TransportMethod, TransportRequest,
        TransportResponse,
    },
    dx::{subscribe::EventsOptions, SpireClientInstance},
};

/// HTTP status returned by the service when a named resource already exists.
pub(crate) const CONFLICT_STATUS: u16 = 409;

/// HTTP status returned by the service for successful create operations.
pub(crate) const CREATED_STATUS: u16 = 201;

fn headers(
    authorization: Option<String>,
    accept: Option<&str>,
    content_type: Option<&str>,
) -> HashMap<String, String> {
    let mut headers = HashMap::new();

    if let Some(authorization) = authorization {
        headers.insert(AUTHORIZATION.into(), authorization);
    }
    if let Some(accept) = accept {
        headers.insert(ACCEPT.into(), accept.into());
    }
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE.into(), content_type.into());
    }

    headers
}

/// `GET` of the API description.
pub(crate) fn discover(url: &str) -> TransportRequest {
    TransportRequest {
        url: url.into(),
        method: TransportMethod::Get,
        headers: headers(None, Some(APPLICATION_JSON), None),
        ..Default::default()
    }
}

/// `GET` of a resource or collection.
pub(crate) fn fetch(
    url: &str,
    capability: Option<&str>,
    accept: &str,
    query: &[(&str, &str)],
) -> TransportRequest {
    TransportRequest {
        url: url.into(),
        method: TransportMethod::Get,
        query_parameters: query
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        headers: headers(capability.map(capability_authorization), Some(accept), None),
        ..Default::default()
    }
}

/// `POST` into a collection.
///
/// `media` holds `Accept` and `Content-Type` values.
pub(crate) fn create<B>(
    url: &str,
    capability: Option<&str>,
    media: Option<(&str, &str)>,
    body: B,
) -> Result<TransportRequest, SpireError>
where
    B: Serialize,
{
    Ok(TransportRequest {
        url: url.into(),
        method: TransportMethod::Post,
        headers: headers(
            capability.map(capability_authorization),
            media.map(|(accept, _)| accept),
            media.map(|(_, content_type)| content_type),
        ),
        body: Some(body.serialize()?),
        ..Default::default()
    })
}

/// `POST` with empty body and arguments in query.
pub(crate) fn submit(url: &str, query: &[(&str, &str)]) -> TransportRequest {
    TransportRequest {
        url: url.into(),
        method: TransportMethod::Post,
        query_parameters: query
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        body: Some(Vec::new()),
        ..Default::default()
    }
}

/// `PUT` of resource properties.
pub(crate) fn replace<B>(
    url: &str,
    capability: Option<&str>,
    media_type: &str,
    body: B,
) -> Result<TransportRequest, SpireError>
where
    B: Serialize,
{
    Ok(TransportRequest {
        url: url.into(),
        method: TransportMethod::Put,
        headers: headers(
            capability.map(capability_authorization),
            Some(media_type),
            Some(media_type),
        ),
        body: Some(body.serialize()?),
        ..Default::default()
    })
}

/// `DELETE` of a resource.
pub(crate) fn remove(url: &str, capability: Option<&str>, media_type: &str) -> TransportRequest {
    TransportRequest {
        url: url.into(),
        method: TransportMethod::Delete,
        headers: headers(
            capability.map(capability_authorization),
            Some(media_type),
            Some(media_type),
        ),
        ..Default::default()
    }
}

/// `GET` of subscription events.
///
/// `timeout` is the local (HTTP) timeout of the request, the server-side one
/// is taken from `options`.
pub(crate) fn events(
    url: &str,
    capability: &str,
    media_type: &str,
    options: &EventsOptions,
    timeout: u64,
) -> TransportRequest {
    let mut query = HashMap::from([("order-by".to_string(), options.order_by.to_string())]);
    let optional = [
        ("timeout", options.timeout),
        ("limit", options.limit),
        ("min_timestamp", options.min_timestamp),
        ("max_timestamp", options.max_timestamp),
        ("delay", options.delay),
        ("last", options.last.map(|cursor| cursor.timestamp)),
    ];
    query.extend(
        optional
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key.to_string(), value.to_string()))),
    );

    TransportRequest {
        url: url.into(),
        method: TransportMethod::Get,
        query_parameters: query,
        headers: headers(Some(capability_authorization(capability)), Some(media_type), None),
        body: None,
        timeout,
    }
}

/// `GET` of application member with HTTP Basic credentials.
pub(crate) fn basic_authentication(
    url: &str,
    login: &str,
    password: &str,
    accept: &str,
) -> TransportRequest {
    let credentials = STANDARD.encode(format!("{login}:{password}"));

    TransportRequest {
        url: url.into(),
        method: TransportMethod::Get,
        query_parameters: HashMap::from([("login".into(), login.into())]),
        headers: headers(Some(format!("Basic {credentials}")), Some(accept), None),
        ..Default::default()
    }
}

/// Map response with unexpected status to an error.
///
/// `409` in response to a create operation becomes [`SpireError::Conflict`]
/// so it can be resolved by looking up the existing resource.
pub(crate) fn check_status(
    response: TransportResponse,
    expected: u16,
) -> Result<TransportResponse, SpireError> {
    if response.status == expected {
        Ok(response)
    } else if response.status == CONFLICT_STATUS && expected == CREATED_STATUS {
        Err(SpireError::Conflict {
            status: response.status,
            body: response.body_text(),
        })
    } else {
        Err(SpireError::remote(response.status, response.body_text()))
    }
}

impl<T, D> SpireClientInstance<T, D>
where
    T: Transport,
    D: Deserializer,
{
    /// Send `request` and make sure the service responded with `expected`
    /// status.
    pub(crate) async fn send_expecting(
        &self,
        request: TransportRequest,
        expected: u16,
    ) -> Result<TransportResponse, SpireError> {
        let response = self.transport.send(request).await?;
        check_status(response, expected)
    }

    /// Send `request` and deserialize response body.
    pub(crate) async fn execute<R>(
        &self,
        request: TransportRequest,
        expected: u16,
    ) -> Result<R, SpireError>
    where
        R: for<'de> serde::Deserialize<'de>,
    {
        let response = self.send_expecting(request, expected).await?;
        self.deserializer
            .deserialize(response.body.as_deref().unwrap_or(b"null"))
    }

    /// Send `request` ignoring response body.
    pub(crate) async fn execute_empty(
        &self,
        request: TransportRequest,
        expected: u16,
    ) -> Result<(), SpireError> {
        self.send_expecting(request, expected).await.map(|_| ())
    }
}
