//! # Application
//!
//! Applications group channels, subscriptions and members of a product built
//! on top of spire.io. Members authenticate against the application with
//! login and password.

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{collections::HashMap, ops::Deref, sync::Arc};

use crate::{
    core::{utils::headers::ACCEPT, Deserializer, SpireError, Transport},
    dx::{
        channel::Channel,
        find_or_create::{find_or_create, CreationAttempts},
        member::Member,
        request,
        resource::{Resource, ResourceCache, ResourceData},
        subscribe::Subscription,
        SpireClientInstance,
    },
};

/// Limits of a channel created in an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelOptions {
    /// Maximum number of messages kept by the channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<u64>,

    /// Time (in seconds) messages are kept by the channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_ttl: Option<u64>,
}

#[derive(Serialize)]
struct NewChannel<'a> {
    name: &'a str,
    #[serde(flatten)]
    options: ChannelOptions,
}

#[derive(Serialize)]
struct NewSubscription<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    channels: Vec<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordReset<'a> {
    reset_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

/// Application handle.
#[derive(Debug)]
pub struct Application<T, D> {
    resource: Resource<T, D>,
    state: Arc<ApplicationState<T, D>>,
}

#[derive(Debug)]
struct ApplicationState<T, D> {
    channels: ResourceCache<Channel<T, D>>,
    subscriptions: ResourceCache<Subscription<T, D>>,
    members: ResourceCache<Member<T, D>>,
    channel_attempts: CreationAttempts,
    subscription_attempts: CreationAttempts,
}

impl<T, D> Application<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            resource: Resource::new(client, "application", data),
            state: Arc::new(ApplicationState {
                channels: Default::default(),
                subscriptions: Default::default(),
                members: Default::default(),
                channel_attempts: Default::default(),
                subscription_attempts: Default::default(),
            }),
        }
    }
}

impl<T, D> Clone for Application<T, D> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, D> Deref for Application<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T, D> Application<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Application channels, fetched once.
    pub async fn channels(&self) -> Result<HashMap<String, Channel<T, D>>, SpireError> {
        match self.state.channels.all() {
            Some(channels) => Ok(channels),
            None => self.channels_refresh().await,
        }
    }

    /// Fetch application channels.
    pub async fn channels_refresh(&self) -> Result<HashMap<String, Channel<T, D>>, SpireError> {
        let collection = self.collection("channels")?;
        let channels = self
            .client
            .list_collection(&collection, "all", "channels", &[])
            .await?
            .into_iter()
            .map(|(name, data)| (name, Channel::new(self.client.clone(), data)))
            .collect::<HashMap<_, _>>();

        self.state.channels.replace(channels.clone());
        Ok(channels)
    }

    /// Create channel `name` with `options` limits.
    ///
    /// # Errors
    /// [`SpireError::Conflict`] when the channel exists already.
    pub async fn create_channel(
        &self,
        name: &str,
        options: ChannelOptions,
    ) -> Result<Channel<T, D>, SpireError> {
        let collection = self.collection("channels")?;
        let data = self
            .client
            .create_in_collection(&collection, "channel", NewChannel { name, options })
            .await?;
        let channel = Channel::new(self.client.clone(), data);

        self.state.channels.insert(name.into(), channel.clone());
        Ok(channel)
    }

    /// Create channel `name` or look up the existing one.
    pub async fn find_or_create_channel(
        &self,
        name: &str,
        options: ChannelOptions,
    ) -> Result<Channel<T, D>, SpireError> {
        if let Some(channel) = self.state.channels.get(name) {
            return Ok(channel);
        }

        let application = self;
        find_or_create(
            "channel",
            name,
            &self.state.channel_attempts,
            move || async move { application.create_channel(name, options).await },
            move || async move {
                application
                    .channels_refresh()
                    .await
                    .map(|mut channels| channels.remove(name))
            },
        )
        .await
    }

    /// Look up channel `name` with the by-name query.
    pub async fn get_channel(&self, name: &str) -> Result<Channel<T, D>, SpireError> {
        let collection = self.collection("channels")?;
        let data = self
            .client
            .list_collection(&collection, "get_by_name", "channels", &[("name", name)])
            .await?
            .remove(name)
            .ok_or_else(|| SpireError::remote(404, format!("no channel named '{name}'")))?;
        let channel = Channel::new(self.client.clone(), data);

        self.state.channels.insert(name.into(), channel.clone());
        Ok(channel)
    }

    /// Application subscriptions, fetched once.
    pub async fn subscriptions(&self) -> Result<HashMap<String, Subscription<T, D>>, SpireError> {
        match self.state.subscriptions.all() {
            Some(subscriptions) => Ok(subscriptions),
            None => self.subscriptions_refresh().await,
        }
    }

    /// Fetch application subscriptions.
    ///
    /// Handles of subscriptions which were already known are kept, so their
    /// cursor and listeners carry over.
    pub async fn subscriptions_refresh(
        &self,
    ) -> Result<HashMap<String, Subscription<T, D>>, SpireError> {
        let collection = self.collection("subscriptions")?;
        let listing = self
            .client
            .list_collection(&collection, "all", "subscriptions", &[])
            .await?;
        let subscriptions = Subscription::from_listing(
            &self.client,
            self.state.subscriptions.all().unwrap_or_default(),
            listing,
        );

        self.state.subscriptions.replace(subscriptions.clone());
        Ok(subscriptions)
    }

    /// Create subscription on application channels `channel_names`.
    ///
    /// Channels unknown to the application are skipped.
    pub async fn create_subscription(
        &self,
        name: Option<&str>,
        channel_names: &[&str],
    ) -> Result<Subscription<T, D>, SpireError> {
        let channels = self.channels().await?;
        let urls = channel_names
            .iter()
            .filter_map(|channel| channels.get(*channel).map(|channel| channel.url()))
            .collect();
        let collection = self.collection("subscriptions")?;
        let data = self
            .client
            .create_in_collection(
                &collection,
                "subscription",
                NewSubscription {
                    name,
                    channels: urls,
                },
            )
            .await?;
        let subscription = Subscription::new(self.client.clone(), data);

        if let Some(name) = subscription.name() {
            self.state.subscriptions.insert(name, subscription.clone());
        }

        Ok(subscription)
    }

    /// Create subscription `name` or look up the existing one.
    pub async fn find_or_create_subscription(
        &self,
        name: &str,
        channel_names: &[&str],
    ) -> Result<Subscription<T, D>, SpireError> {
        if let Some(subscription) = self.state.subscriptions.get(name) {
            return Ok(subscription);
        }

        let application = self;
        find_or_create(
            "subscription",
            name,
            &self.state.subscription_attempts,
            move || async move {
                application
                    .create_subscription(Some(name), channel_names)
                    .await
            },
            move || async move {
                application
                    .subscriptions_refresh()
                    .await
                    .map(|mut subscriptions| subscriptions.remove(name))
            },
        )
        .await
    }

    /// Look up subscription `name` with the by-name query.
    pub async fn get_subscription(&self, name: &str) -> Result<Subscription<T, D>, SpireError> {
        let collection = self.collection("subscriptions")?;
        let data = self
            .client
            .list_collection(&collection, "get_by_name", "subscriptions", &[("name", name)])
            .await?
            .remove(name)
            .ok_or_else(|| SpireError::remote(404, format!("no subscription named '{name}'")))?;
        let subscription = Subscription::new(self.client.clone(), data);

        self.state.subscriptions.insert(name.into(), subscription.clone());
        Ok(subscription)
    }

    /// Register application member with `properties` (`login`, `password`,
    /// `email`, ...).
    pub async fn create_member(
        &self,
        properties: Map<String, Value>,
    ) -> Result<Member<T, D>, SpireError> {
        let collection = self.collection("members")?;
        let data = self
            .client
            .create_in_collection(&collection, "member", properties)
            .await?;
        let member = Member::new(self.client.clone(), data);

        if let Some(login) = member.login() {
            self.state.members.insert(login, member.clone());
        }

        Ok(member)
    }

    /// Application members, fetched once.
    pub async fn members(&self) -> Result<HashMap<String, Member<T, D>>, SpireError> {
        match self.state.members.all() {
            Some(members) => Ok(members),
            None => self.members_refresh().await,
        }
    }

    /// Fetch application members.
    pub async fn members_refresh(&self) -> Result<HashMap<String, Member<T, D>>, SpireError> {
        let collection = self.collection("members")?;
        let members = self
            .client
            .list_collection(&collection, "all", "members", &[])
            .await?
            .into_iter()
            .map(|(login, data)| (login, Member::new(self.client.clone(), data)))
            .collect::<HashMap<_, _>>();

        self.state.members.replace(members.clone());
        Ok(members)
    }

    /// Look up member by `login`.
    pub async fn get_member(&self, login: &str) -> Result<Member<T, D>, SpireError> {
        let collection = self.collection("members")?;
        let data = self
            .client
            .list_collection(&collection, "get_by_login", "member", &[("login", login)])
            .await?
            .remove(login)
            .ok_or_else(|| SpireError::remote(404, format!("no member with login '{login}'")))?;
        let member = Member::new(self.client.clone(), data);

        self.state.members.insert(login.into(), member.clone());
        Ok(member)
    }

    /// Authenticate member with HTTP Basic credentials.
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Member<T, D>, SpireError> {
        let collection = self.collection("members")?;
        let media_type = self.client.media_type("member").await?;
        let request = request::basic_authentication(&collection.url, login, password, &media_type);

        let data: ResourceData = self.client.execute(request, 200).await?;
        debug!("Authenticated member '{login}' of {}", self.url());
        Ok(Member::new(self.client.clone(), data))
    }

    /// Authenticate member with credentials sent in the request body.
    pub async fn authenticate_with_post(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Member<T, D>, SpireError> {
        self.post_authentication(Credentials { login, password })
            .await
    }

    /// Set a new member password with the key received in the reset email.
    ///
    /// Without `new_password` the member is authenticated and the password
    /// has to be changed later with the returned member capabilities.
    pub async fn reset_password(
        &self,
        reset_key: &str,
        new_password: Option<&str>,
    ) -> Result<Member<T, D>, SpireError> {
        self.post_authentication(PasswordReset {
            reset_key,
            password: new_password,
        })
        .await
    }

    /// Ask the service to send password reset email to member `email`.
    pub async fn request_member_password_reset(&self, email: &str) -> Result<(), SpireError> {
        let collection = self.collection("members")?;
        let request = request::submit(&collection.url, &[("email", email)]);

        self.client.execute_empty(request, 202).await
    }

    async fn post_authentication<B>(&self, body: B) -> Result<Member<T, D>, SpireError>
    where
        B: Serialize,
    {
        let collection = self.collection("authentication")?;
        let media_type = self.client.media_type("member").await?;
        let mut request = request::create(&collection.url, None, None, body)?;
        request.headers.insert(ACCEPT.into(), media_type);

        let data: ResourceData = self
            .client
            .execute(request, request::CREATED_STATUS)
            .await?;
        Ok(Member::new(self.client.clone(), data))
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::{
        core::TransportMethod,
        dx::mock::{channel_json, client, collection_json, subscription_json, MockClient, BASE},
    };
    use serde_json::json;

    fn application(client: MockClient) -> Application<
        crate::transport::SpireMiddleware<crate::dx::mock::MockTransport>,
        crate::providers::deserialization_serde::DeserializerSerde,
    > {
        Application::new(
            client,
            serde_json::from_value(json!({
                "url": format!("{BASE}/application/1"),
                "name": "chat",
                "capabilities": { "get": "app-get" },
                "resources": {
                    "channels": collection_json(&format!("{BASE}/application/1/channels"), "app-channels"),
                    "subscriptions": collection_json(&format!("{BASE}/application/1/subscriptions"), "app-subscriptions"),
                    "members": collection_json(&format!("{BASE}/application/1/members"), "app-members"),
                    "authentication": { "url": format!("{BASE}/application/1/authentication") }
                }
            }))
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn create_channel_with_limits() {
        let (client, transport) = client();
        transport.on(
            TransportMethod::Post,
            &format!("{BASE}/application/1/channels"),
            201,
            channel_json("room"),
        );
        let application = application(client);

        let channel = application
            .create_channel(
                "room",
                ChannelOptions {
                    message_limit: Some(10),
                    message_ttl: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(channel.name().as_deref(), Some("room"));
        let request = transport.last_request(TransportMethod::Post).unwrap();
        let body: Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body, json!({ "name": "room", "message_limit": 10 }));
        assert_eq!(
            request.headers.get("Authorization").unwrap(),
            "Capability app-channels-create"
        );
    }

    #[tokio::test]
    async fn find_existing_channel_on_conflict() {
        let (client, transport) = client();
        let url = format!("{BASE}/application/1/channels");
        transport.on(TransportMethod::Post, &url, 409, json!("exists"));
        transport.on(
            TransportMethod::Get,
            &url,
            200,
            json!({ "room": channel_json("room") }),
        );
        let application = application(client);

        let channel = application
            .find_or_create_channel("room", ChannelOptions::default())
            .await
            .unwrap();

        assert_eq!(channel.url(), format!("{BASE}/channel/room"));
    }

    #[tokio::test]
    async fn get_channel_by_name() {
        let (client, transport) = client();
        let url = format!("{BASE}/application/1/channels");
        transport.on(
            TransportMethod::Get,
            &url,
            200,
            json!({ "room": channel_json("room") }),
        );
        let application = application(client);

        let channel = application.get_channel("room").await.unwrap();

        assert_eq!(channel.url(), format!("{BASE}/channel/room"));
        let request = transport.last_request(TransportMethod::Get).unwrap();
        assert_eq!(request.query_parameters.get("name").unwrap(), "room");
        assert_eq!(
            request.headers.get("Authorization").unwrap(),
            "Capability app-channels-by-name"
        );
    }

    #[tokio::test]
    async fn create_subscription_on_known_channels() {
        let (client, transport) = client();
        transport.on(
            TransportMethod::Get,
            &format!("{BASE}/application/1/channels"),
            200,
            json!({ "room": channel_json("room") }),
        );
        transport.on(
            TransportMethod::Post,
            &format!("{BASE}/application/1/subscriptions"),
            201,
            subscription_json("reader"),
        );
        let application = application(client);

        application
            .create_subscription(Some("reader"), &["room", "unknown"])
            .await
            .unwrap();

        let request = transport.last_request(TransportMethod::Post).unwrap();
        let body: Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(
            body,
            json!({ "name": "reader", "channels": [format!("{BASE}/channel/room")] })
        );
    }

    #[tokio::test]
    async fn authenticate_member_with_basic_credentials() {
        let (client, transport) = client();
        transport.on(
            TransportMethod::Get,
            &format!("{BASE}/application/1/members"),
            200,
            json!({ "url": format!("{BASE}/member/1"), "login": "joe" }),
        );
        let application = application(client);

        let member = application.authenticate("joe", "secret").await.unwrap();

        assert_eq!(member.login().as_deref(), Some("joe"));
        let request = transport.last_request(TransportMethod::Get).unwrap();
        assert_eq!(request.query_parameters.get("login").unwrap(), "joe");
        assert!(request
            .headers
            .get("Authorization")
            .unwrap()
            .starts_with("Basic "));
    }

    #[tokio::test]
    async fn authenticate_member_with_post() {
        let (client, transport) = client();
        transport.on(
            TransportMethod::Post,
            &format!("{BASE}/application/1/authentication"),
            201,
            json!({ "url": format!("{BASE}/member/1"), "login": "joe" }),
        );
        let application = application(client);

        application
            .authenticate_with_post("joe", "secret")
            .await
            .unwrap();

        let request = transport.last_request(TransportMethod::Post).unwrap();
        let body: Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body, json!({ "login": "joe", "password": "secret" }));
        assert_eq!(
            request.headers.get("Accept").unwrap(),
            "application/vnd.spire-io.member+json;version=1.0"
        );
    }

    #[tokio::test]
    async fn request_member_password_reset() {
        let (client, transport) = client();
        transport.on(
            TransportMethod::Post,
            &format!("{BASE}/application/1/members"),
            202,
            json!(null),
        );
        let application = application(client);

        application
            .request_member_password_reset("joe@example.com")
            .await
            .unwrap();

        let request = transport.last_request(TransportMethod::Post).unwrap();
        assert_eq!(
            request.query_parameters.get("email").unwrap(),
            "joe@example.com"
        );
        assert_eq!(request.body, Some(Vec::new()));
    }

    #[tokio::test]
    async fn list_members_once() {
        let (client, transport) = client();
        let url = format!("{BASE}/application/1/members");
        transport.on(
            TransportMethod::Get,
            &url,
            200,
            json!({ "joe": { "url": format!("{BASE}/member/1"), "login": "joe" } }),
        );
        let application = application(client);

        application.members().await.unwrap();
        let members = application.members().await.unwrap();

        assert!(members.contains_key("joe"));
        assert_eq!(transport.requests_to(TransportMethod::Get, &url).len(), 1);
    }
}
