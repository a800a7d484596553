//! # Transport middleware
//!
//! [`SpireMiddleware`] wraps whatever [`Transport`] the client has been built
//! with and fills in request properties shared by every call.
//!
//! [`Transport`]: ../../core/trait.Transport.html

use crate::core::{
    utils::headers::USER_AGENT, SpireError, Transport, TransportRequest, TransportResponse,
};
use log::debug;
use std::sync::Arc;

/// Transport wrapper used by [`SpireClient`].
///
/// Adds the `User-Agent` header and the default request timeout to requests
/// which don't set their own.
///
/// [`SpireClient`]: ../../dx/spire_client/type.SpireClient.html
#[derive(Debug)]
pub struct SpireMiddleware<T>
where
    T: Transport,
{
    pub(crate) transport: T,
    pub(crate) user_agent: Arc<String>,
    pub(crate) request_timeout: u64,
}

#[async_trait::async_trait]
impl<T> Transport for SpireMiddleware<T>
where
    T: Transport + Sync + Send,
{
    async fn send(&self, mut req: TransportRequest) -> Result<TransportResponse, SpireError> {
        req.headers
            .entry(USER_AGENT.into())
            .or_insert_with(|| self.user_agent.to_string());

        if req.timeout == 0 {
            req.timeout = self.request_timeout;
        }

        debug!(
            "{} {} (query: {:?}, timeout: {}s)",
            req.method, req.url, req.query_parameters, req.timeout
        );

        self.transport.send(req).await
    }
}
