//! spire.io client module
//!
//! This module contains the [`SpireClient`] type.
//! It's used to send requests to [`spire.io API`].
//! It's intended to be used by the [`spire_io`] crate.
//!
//! [`spire.io API`]: https://www.spire.io/docs
//! [`spire_io`]: ../index.html

use derive_builder::Builder;
use log::info;
use serde::Serialize;
use spin::RwLock;
use std::{ops::Deref, sync::Arc};

#[cfg(feature = "tokio")]
use crate::providers::futures_tokio::RuntimeTokio;
#[cfg(feature = "reqwest")]
use crate::transport::TransportReqwest;

use crate::{
    core::{Deserializer, Runtime, RuntimeSupport, SpireError, Transport},
    dx::{description::ApiDescription, request, session::Session},
    providers::deserialization_serde::DeserializerSerde,
    transport::middleware::SpireMiddleware,
};

/// Default discovery URL of the spire.io API.
pub const DEFAULT_URL: &str = "https://api.spire.io";

/// Schema version used when none has been configured.
pub const DEFAULT_API_VERSION: &str = "1.0";

/// spire.io client
///
/// Client for spire.io API.
/// The client is transport-layer-agnostic, so you can use any transport layer
/// that implements the [`Transport`] trait.
///
/// You can create clients using the [`SpireClientBuilder::with_transport`]
/// method.
///
/// To see available methods, please refer to the [`SpireClientInstance`]
/// documentation.
///
/// # Examples
/// ```
/// use spire_io::SpireClientBuilder;
///
/// # use spire_io::core::{Transport, TransportRequest, TransportResponse, SpireError};
/// # struct MyTransport;
/// # #[async_trait::async_trait]
/// # impl Transport for MyTransport {
/// #     async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, SpireError> {
/// #         unimplemented!()
/// #     }
/// # }
///
/// # fn main() -> Result<(), SpireError> {
/// // note that MyTransport must implement the `Transport` trait
/// let spire = SpireClientBuilder::with_transport(MyTransport)
///    .with_default_url()
///    .build()?;
///
/// # Ok(())
/// # }
/// ```
///
/// # Synchronization
///
/// Client is thread-safe and can be shared between threads. You don't need to
/// wrap it in `Arc` or `Mutex` because it is already wrapped in `Arc` and uses
/// interior mutability for its internal state.
///
/// [`Transport`]: ../core/trait.Transport.html
/// [`SpireClientBuilder::with_transport`]: struct.SpireClientBuilder.html#method.with_transport
pub type SpireGenericClient<T, D> = SpireClientInstance<SpireMiddleware<T>, D>;

/// spire.io client
///
/// Client for spire.io API which uses [`reqwest`] as a transport layer and
/// [`serde`] for responses deserialization.
///
/// # Examples
/// ```
/// use spire_io::SpireClientBuilder;
///
/// # fn main() -> Result<(), spire_io::core::SpireError> {
/// let spire = SpireClientBuilder::with_reqwest_transport()
///    .with_url("https://api.spire.io")
///    .build()?;
///
/// # Ok(())
/// # }
/// ```
///
/// [`reqwest`]: https://crates.io/crates/reqwest
/// [`serde`]: https://crates.io/crates/serde
#[cfg(feature = "reqwest")]
pub type SpireClient = SpireGenericClient<TransportReqwest, DeserializerSerde>;

/// spire.io client raw instance.
///
/// This struct contains the actual client state.
/// It shouldn't be used directly. Use [`SpireGenericClient`] or
/// [`SpireClient`] instead.
#[derive(Debug)]
pub struct SpireClientInstance<T, D> {
    pub(crate) inner: Arc<SpireClientRef<T, D>>,
}

impl<T, D> Deref for SpireClientInstance<T, D> {
    type Target = SpireClientRef<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T, D> Clone for SpireClientInstance<T, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Client reference
///
/// This struct contains the actual client state.
/// It's wrapped in `Arc` by [`SpireClient`] and uses interior mutability for
/// its internal state.
///
/// Not intended to be used directly. Use [`SpireClient`] instead.
#[derive(Builder, Debug)]
#[builder(
    pattern = "owned",
    name = "SpireClientConfigBuilder",
    build_fn(private, name = "build_internal"),
    setter(prefix = "with")
)]
pub struct SpireClientRef<T, D> {
    /// Transport layer
    pub(crate) transport: T,

    /// [`spire.io API`] responses deserializer
    ///
    /// [`spire.io API`]: https://www.spire.io/docs
    pub(crate) deserializer: Arc<D>,

    /// Configuration
    pub(crate) config: SpireConfig,

    /// Runtime environment
    #[builder(setter(custom), field(vis = "pub(crate)"))]
    pub(crate) runtime: RuntimeSupport,

    /// API description received from discovery.
    #[builder(setter(skip), field(vis = "pub(crate)"))]
    pub(crate) description: RwLock<Option<Arc<ApiDescription>>>,
}

/// Account registration details.
///
/// Used with [`SpireClientInstance::create_account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    /// Account email address.
    pub email: String,

    /// Account password.
    pub password: String,

    /// Password confirmation (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

#[derive(Serialize)]
struct KeyCredentials<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct LoginCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordReset<'a> {
    email: &'a str,
}

impl<T, D> SpireClientInstance<T, D> {
    /// Client configuration.
    pub fn config(&self) -> &SpireConfig {
        &self.config
    }
}

impl<T, D> SpireClientInstance<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Fetch the API description.
    ///
    /// Discovery is performed lazily by every operation which needs it, call
    /// this method to refresh the description explicitly.
    ///
    /// # Errors
    /// [`SpireError::Remote`] when the service doesn't respond with `200`.
    pub async fn discover(&self) -> Result<Arc<ApiDescription>, SpireError> {
        let request = request::discover(&self.config.url);
        let description: ApiDescription = self.execute(request, 200).await?;
        let description = Arc::new(description);

        info!(
            "Discovered spire.io API at {} ({} resources)",
            self.config.url,
            description.resources.len()
        );

        *self.description.write() = Some(description.clone());
        Ok(description)
    }

    /// API description, discovering it first if required.
    pub async fn description(&self) -> Result<Arc<ApiDescription>, SpireError> {
        let cached = self.description.read().clone();
        match cached {
            Some(description) => Ok(description),
            None => self.discover().await,
        }
    }

    /// Media type of the schema entry `name` for the configured API version.
    ///
    /// # Errors
    /// [`SpireError::Schema`] when the description doesn't contain `name`.
    pub async fn media_type(&self, name: &str) -> Result<String, SpireError> {
        self.description()
            .await?
            .media_type(&self.config.api_version, name)
            .map(ToString::to_string)
    }

    /// Start a session with an account secret key.
    pub async fn create_session<S>(&self, key: S) -> Result<Session<T, D>, SpireError>
    where
        S: AsRef<str>,
    {
        self.open_session(
            "sessions",
            KeyCredentials {
                key: key.as_ref(),
            },
        )
        .await
    }

    /// Start a session with account email and password.
    pub async fn login<S>(&self, email: S, password: S) -> Result<Session<T, D>, SpireError>
    where
        S: AsRef<str>,
    {
        self.open_session(
            "sessions",
            LoginCredentials {
                email: email.as_ref(),
                password: password.as_ref(),
            },
        )
        .await
    }

    /// Register a new account and start a session for it.
    pub async fn create_account(&self, info: AccountInfo) -> Result<Session<T, D>, SpireError> {
        self.open_session("accounts", info).await
    }

    /// Ask the service to send password reset instructions to `email`.
    ///
    /// The service answers with `202 Accepted`.
    pub async fn password_reset_request<S>(&self, email: S) -> Result<(), SpireError>
    where
        S: AsRef<str>,
    {
        let description = self.description().await?;
        let request = request::create(
            description.resource_url("accounts")?,
            None,
            None,
            PasswordReset {
                email: email.as_ref(),
            },
        )?;

        self.execute_empty(request, 202).await
    }

    async fn open_session<B>(&self, resource: &str, body: B) -> Result<Session<T, D>, SpireError>
    where
        B: Serialize,
    {
        let description = self.description().await?;
        let version = &self.config.api_version;
        let request = request::create(
            description.resource_url(resource)?,
            None,
            Some((
                description.media_type(version, "session")?,
                description.media_type(version, "account")?,
            )),
            body,
        )?;

        let session = Session::new(self.clone(), self.execute(request, 201).await?);
        info!("Started session {}", session.url());

        Ok(session)
    }
}

impl<T, D> SpireClientConfigBuilder<T, D> {
    /// Schema version used to look up media types.
    ///
    /// Defaults to `1.0`.
    pub fn with_api_version<S>(mut self, version: S) -> Self
    where
        S: Into<String>,
    {
        if let Some(configuration) = self.config.as_mut() {
            configuration.api_version = version.into();
        }

        self
    }

    /// `User-Agent` header sent with every request.
    pub fn with_user_agent<S>(mut self, user_agent: S) -> Self
    where
        S: Into<String>,
    {
        if let Some(configuration) = self.config.as_mut() {
            configuration.user_agent = user_agent.into();
        }

        self
    }

    /// Timeout (in seconds) of any request except long-poll.
    pub fn with_request_timeout(mut self, timeout: u64) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.transport.request_timeout = timeout;
        }

        self
    }

    /// Server-side timeout (in seconds) used by [`Subscription::long_poll`].
    ///
    /// [`Subscription::long_poll`]: ../subscribe/struct.Subscription.html#method.long_poll
    pub fn with_long_poll_timeout(mut self, timeout: u64) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.transport.long_poll_timeout = timeout;
        }

        self
    }

    /// Time (in seconds) added on top of server-side long-poll timeout before
    /// the request is cancelled locally.
    pub fn with_long_poll_grace(mut self, grace: u64) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.transport.long_poll_grace = grace;
        }

        self
    }

    /// Build a [`SpireClient`] from the builder
    pub fn build(self) -> Result<SpireClientInstance<SpireMiddleware<T>, D>, SpireError>
    where
        T: Transport,
    {
        self.build_internal()
            .map_err(|err| SpireError::ClientInitialization {
                details: err.to_string(),
            })
            .and_then(|pre_build| {
                if pre_build.config.url.is_empty() {
                    return Err(SpireError::ClientInitialization {
                        details: "Discovery URL can't be empty".into(),
                    });
                }

                info!(
                    "Client Configuration: \n url: {}\n api_version: {}\n user_agent: {}",
                    pre_build.config.url, pre_build.config.api_version, pre_build.config.user_agent
                );

                Ok(SpireClientRef {
                    transport: SpireMiddleware {
                        user_agent: Arc::new(pre_build.config.user_agent.clone()),
                        request_timeout: pre_build.config.transport.request_timeout,
                        transport: pre_build.transport,
                    },
                    deserializer: pre_build.deserializer,
                    config: pre_build.config,
                    runtime: pre_build.runtime,
                    description: RwLock::new(None),
                })
            })
            .map(|client| SpireClientInstance {
                inner: Arc::new(client),
            })
    }
}

/// Transport specific configuration
///
/// Configuration let specify timeouts for two types of requests:
/// * `long-poll` - subscription events requests
/// * `regular` - any other requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfiguration {
    /// Timeout after which regular request will be cancelled.
    pub request_timeout: u64,

    /// Server-side timeout used by long-poll requests.
    pub long_poll_timeout: u64,

    /// Time added on top of server-side timeout of long-poll request before it
    /// is cancelled locally.
    pub long_poll_grace: u64,
}

impl Default for TransportConfiguration {
    fn default() -> Self {
        Self {
            request_timeout: 10,
            long_poll_timeout: 30,
            long_poll_grace: 10,
        }
    }
}

/// spire.io configuration
///
/// Configuration for [`SpireClient`].
/// This struct separates the configuration from the actual client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpireConfig {
    /// Discovery URL
    pub(crate) url: String,

    /// Schema version
    pub(crate) api_version: String,

    /// `User-Agent` header value
    pub(crate) user_agent: String,

    /// Transport configuration.
    pub transport: TransportConfiguration,
}

impl SpireConfig {
    fn new(url: String) -> Self {
        Self {
            url,
            api_version: DEFAULT_API_VERSION.into(),
            user_agent: format!("spire-io-rust/{}", env!("CARGO_PKG_VERSION")),
            transport: Default::default(),
        }
    }

    /// Discovery URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Schema version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

fn config_builder<T, D>(
    transport: T,
    runtime: RuntimeSupport,
    deserializer: D,
    url: String,
) -> SpireClientConfigBuilder<T, D> {
    SpireClientConfigBuilder {
        transport: Some(transport),
        deserializer: Some(Arc::new(deserializer)),
        config: Some(SpireConfig::new(url)),
        runtime: Some(runtime),
        ..Default::default()
    }
}

/// spire.io builder for [`SpireClient`]
///
/// Builder for [`SpireClient`] that is a first step to create a client.
/// The client is transport-layer-agnostic, so you can use any transport layer
/// that implements the [`Transport`] trait.
///
/// The builder provides methods to set the transport layer and returns the next
/// step of the builder with the remaining parameters.
///
/// See [`SpireClient`] for more information.
#[derive(Debug, Clone)]
pub struct SpireClientBuilder;

impl SpireClientBuilder {
    /// Set the transport layer for the client.
    ///
    /// Returns [`SpireClientRuntimeBuilder`] where runtime environment or
    /// discovery URL can be set.
    ///
    /// # Examples
    /// ```
    /// # use spire_io::core::{Transport, TransportRequest, TransportResponse, SpireError};
    /// use spire_io::SpireClientBuilder;
    /// #
    /// # struct MyTransport;
    /// # #[async_trait::async_trait]
    /// # impl Transport for MyTransport {
    /// #     async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, SpireError> {
    /// #         unimplemented!()
    /// #     }
    /// # }
    ///
    /// # fn main() -> Result<(), SpireError> {
    /// let spire = SpireClientBuilder::with_transport(MyTransport)
    ///     .with_url("https://api.spire.io")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// [`SpireClientRuntimeBuilder`]: struct.SpireClientRuntimeBuilder.html
    pub fn with_transport<T>(transport: T) -> SpireClientRuntimeBuilder<T>
    where
        T: Transport,
    {
        SpireClientRuntimeBuilder { transport }
    }
}

/// spire.io builder for [`SpireClient`] used to set runtime environment.
///
/// Runtime is used to run subscription listening loop and listener
/// invocations.
pub struct SpireClientRuntimeBuilder<T> {
    /// Transport layer.
    pub(crate) transport: T,
}

impl<T> SpireClientRuntimeBuilder<T> {
    /// Set runtime environment.
    ///
    /// Returns [`SpireClientDeserializerBuilder`] where response
    /// deserializer or discovery URL can be set.
    ///
    /// See [`Runtime`] trait for more information.
    ///
    /// [`SpireClientDeserializerBuilder`]: struct.SpireClientDeserializerBuilder.html
    /// [`Runtime`]: ../core/trait.Runtime.html
    pub fn with_runtime<R>(self, runtime: R) -> SpireClientDeserializerBuilder<T>
    where
        R: Runtime,
    {
        SpireClientDeserializerBuilder {
            transport: self.transport,
            runtime: RuntimeSupport::new(runtime),
        }
    }

    /// Set discovery URL and use `tokio` runtime with `serde` deserializer.
    #[cfg(feature = "tokio")]
    pub fn with_url<S>(self, url: S) -> SpireClientConfigBuilder<T, DeserializerSerde>
    where
        S: Into<String>,
    {
        config_builder(
            self.transport,
            RuntimeSupport::new(RuntimeTokio),
            DeserializerSerde,
            url.into(),
        )
    }

    /// Use [`DEFAULT_URL`] for discovery with `tokio` runtime and `serde`
    /// deserializer.
    #[cfg(feature = "tokio")]
    pub fn with_default_url(self) -> SpireClientConfigBuilder<T, DeserializerSerde> {
        self.with_url(DEFAULT_URL)
    }
}

/// spire.io builder for [`SpireClient`] used to set custom deserializer.
///
/// Deserializer will be used to process request responses from [`spire.io API`].
///
/// [`spire.io API`]: https://www.spire.io/docs
pub struct SpireClientDeserializerBuilder<T> {
    /// Transport later.
    pub(crate) transport: T,

    /// Runtime environment
    pub(crate) runtime: RuntimeSupport,
}

impl<T> SpireClientDeserializerBuilder<T> {
    /// Set [`spire.io API`] responses deserializer.
    ///
    /// See [`Deserializer`] for more information.
    ///
    /// [`Deserializer`]: ../core/trait.Deserializer.html
    /// [`spire.io API`]: https://www.spire.io/docs
    pub fn with_deserializer<D>(self, deserializer: D) -> SpireClientUrlBuilder<T, D>
    where
        D: Deserializer,
    {
        SpireClientUrlBuilder {
            transport: self.transport,
            runtime: self.runtime,
            deserializer,
        }
    }

    /// Set discovery URL and use `serde` deserializer.
    pub fn with_url<S>(self, url: S) -> SpireClientConfigBuilder<T, DeserializerSerde>
    where
        S: Into<String>,
    {
        config_builder(self.transport, self.runtime, DeserializerSerde, url.into())
    }

    /// Use [`DEFAULT_URL`] for discovery with `serde` deserializer.
    pub fn with_default_url(self) -> SpireClientConfigBuilder<T, DeserializerSerde> {
        self.with_url(DEFAULT_URL)
    }
}

/// spire.io builder for [`SpireClient`] used to set discovery URL.
pub struct SpireClientUrlBuilder<T, D> {
    transport: T,
    runtime: RuntimeSupport,
    deserializer: D,
}

impl<T, D> SpireClientUrlBuilder<T, D> {
    /// Set discovery URL.
    ///
    /// It returns [`SpireClientConfigBuilder`] that you can use to set the
    /// configuration for the client.
    pub fn with_url<S>(self, url: S) -> SpireClientConfigBuilder<T, D>
    where
        S: Into<String>,
    {
        config_builder(self.transport, self.runtime, self.deserializer, url.into())
    }

    /// Use [`DEFAULT_URL`] for discovery.
    pub fn with_default_url(self) -> SpireClientConfigBuilder<T, D> {
        self.with_url(DEFAULT_URL)
    }
}
