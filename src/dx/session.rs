//! # Session
//!
//! Authenticated view of an account. A session lists the account resources
//! (channels, subscriptions, applications, notifications) and creates new
//! ones.

use log::debug;
use serde::Serialize;
use spin::RwLock;
use std::{collections::HashMap, ops::Deref, sync::Arc};

use crate::{
    core::{Deserializer, SpireError, Transport},
    dx::{
        account::Account,
        application::Application,
        channel::Channel,
        find_or_create::{find_or_create, CreationAttempts},
        notification::Notification,
        resource::{Resource, ResourceCache, ResourceData},
        subscribe::Subscription,
        SpireClientInstance,
    },
};

/// Session handle.
///
/// Created with [`SpireClientInstance::create_session`],
/// [`SpireClientInstance::login`] or [`SpireClientInstance::create_account`].
/// Collections are fetched on first use and cached, `*_refresh` methods
/// fetch them again.
///
/// # Examples
/// ```no_run
/// # use spire_io::{core::SpireError, SpireClientBuilder};
/// # #[tokio::main]
/// # async fn main() -> Result<(), SpireError> {
/// let spire = SpireClientBuilder::with_reqwest_transport()
///     .with_default_url()
///     .build()?;
/// let session = spire.login("user@example.com", "password").await?;
///
/// let channel = session.find_or_create_channel("news").await?;
/// channel.publish("Hello").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session<T, D> {
    inner: Arc<SessionState<T, D>>,
}

/// State shared by [`Session`] clones.
#[derive(Debug)]
struct SessionState<T, D> {
    resource: Resource<T, D>,
    account: RwLock<Option<Account<T, D>>>,
    channels: ResourceCache<Channel<T, D>>,
    subscriptions: ResourceCache<Subscription<T, D>>,
    applications: ResourceCache<Application<T, D>>,
    notifications: ResourceCache<Notification<T, D>>,
    channel_attempts: CreationAttempts,
    subscription_attempts: CreationAttempts,
    application_attempts: CreationAttempts,
    notification_attempts: CreationAttempts,
}

#[derive(Serialize)]
struct NewChannel<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct NewSubscription<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    channels: Vec<String>,
}

#[derive(Serialize)]
struct NewApplication<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct NewNotification<'a> {
    name: &'a str,
    mode: &'a str,
}

impl<T, D> Session<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            inner: Arc::new(SessionState {
                resource: Resource::new(client, "session", data),
                account: RwLock::new(None),
                channels: Default::default(),
                subscriptions: Default::default(),
                applications: Default::default(),
                notifications: Default::default(),
                channel_attempts: Default::default(),
                subscription_attempts: Default::default(),
                application_attempts: Default::default(),
                notification_attempts: Default::default(),
            }),
        }
    }
}

impl<T, D> Clone for Session<T, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, D> Deref for Session<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.inner.resource
    }
}

impl<T, D> Session<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Session account, fetched once.
    pub async fn account(&self) -> Result<Account<T, D>, SpireError> {
        let cached = self.inner.account.read().clone();
        match cached {
            Some(account) => Ok(account),
            None => self.account_refresh().await,
        }
    }

    /// Fetch session account.
    pub async fn account_refresh(&self) -> Result<Account<T, D>, SpireError> {
        let account = Account::new(self.client.clone(), self.data().resource("account")?);
        account.get().await?;

        *self.inner.account.write() = Some(account.clone());
        Ok(account)
    }

    /// Account channels, fetched once.
    pub async fn channels(&self) -> Result<HashMap<String, Channel<T, D>>, SpireError> {
        match self.inner.channels.all() {
            Some(channels) => Ok(channels),
            None => self.channels_refresh().await,
        }
    }

    /// Fetch account channels.
    pub async fn channels_refresh(&self) -> Result<HashMap<String, Channel<T, D>>, SpireError> {
        let collection = self.collection("channels")?;
        let channels = self
            .client
            .list_collection(&collection, "all", "channels", &[])
            .await?
            .into_iter()
            .map(|(name, data)| (name, Channel::new(self.client.clone(), data)))
            .collect::<HashMap<_, _>>();

        self.inner.channels.replace(channels.clone());
        Ok(channels)
    }

    /// Create channel `name`.
    ///
    /// # Errors
    /// [`SpireError::Conflict`] when the channel exists already, use
    /// [`Session::find_or_create_channel`] to get the existing one instead.
    pub async fn create_channel(&self, name: &str) -> Result<Channel<T, D>, SpireError> {
        let collection = self.collection("channels")?;
        let data = self
            .client
            .create_in_collection(&collection, "channel", NewChannel { name })
            .await?;
        let channel = Channel::new(self.client.clone(), data);

        debug!("Created channel '{name}' at {}", channel.url());
        self.inner.channels.insert(name.into(), channel.clone());
        Ok(channel)
    }

    /// Create channel `name` or look up the existing one.
    pub async fn find_or_create_channel(&self, name: &str) -> Result<Channel<T, D>, SpireError> {
        if let Some(channel) = self.inner.channels.get(name) {
            return Ok(channel);
        }

        let session = self;
        find_or_create(
            "channel",
            name,
            &self.inner.channel_attempts,
            move || async move { session.create_channel(name).await },
            move || async move {
                session
                    .channels_refresh()
                    .await
                    .map(|mut channels| channels.remove(name))
            },
        )
        .await
    }

    /// Channel `name`, created when it doesn't exist.
    pub async fn channel(&self, name: &str) -> Result<Channel<T, D>, SpireError> {
        self.find_or_create_channel(name).await
    }

    /// Account subscriptions, fetched once.
    pub async fn subscriptions(&self) -> Result<HashMap<String, Subscription<T, D>>, SpireError> {
        match self.inner.subscriptions.all() {
            Some(subscriptions) => Ok(subscriptions),
            None => self.subscriptions_refresh().await,
        }
    }

    /// Fetch account subscriptions.
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
            self.inner.subscriptions.all().unwrap_or_default(),
            listing,
        );

        self.inner.subscriptions.replace(subscriptions.clone());
        Ok(subscriptions)
    }

    /// Create subscription on channels `channel_names`.
    ///
    /// # Errors
    /// [`SpireError::InvalidArgument`] when one of the channels doesn't exist.
    pub async fn create_subscription(
        &self,
        name: Option<&str>,
        channel_names: &[&str],
    ) -> Result<Subscription<T, D>, SpireError> {
        let urls = self.channel_urls(channel_names).await?;
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

        debug!("Created subscription at {}", subscription.url());
        if let Some(name) = subscription.name() {
            self.inner.subscriptions.insert(name, subscription.clone());
        }

        Ok(subscription)
    }

    /// Create subscription `name` or look up the existing one.
    pub async fn find_or_create_subscription(
        &self,
        name: &str,
        channel_names: &[&str],
    ) -> Result<Subscription<T, D>, SpireError> {
        if let Some(subscription) = self.inner.subscriptions.get(name) {
            return Ok(subscription);
        }

        let session = self;
        find_or_create(
            "subscription",
            name,
            &self.inner.subscription_attempts,
            move || async move {
                session
                    .create_subscription(Some(name), channel_names)
                    .await
            },
            move || async move {
                session
                    .subscriptions_refresh()
                    .await
                    .map(|mut subscriptions| subscriptions.remove(name))
            },
        )
        .await
    }

    /// Account applications, fetched once.
    pub async fn applications(&self) -> Result<HashMap<String, Application<T, D>>, SpireError> {
        match self.inner.applications.all() {
            Some(applications) => Ok(applications),
            None => self.applications_refresh().await,
        }
    }

    /// Fetch account applications.
    pub async fn applications_refresh(
        &self,
    ) -> Result<HashMap<String, Application<T, D>>, SpireError> {
        let collection = self.collection("applications")?;
        let applications = self
            .client
            .list_collection(&collection, "all", "applications", &[])
            .await?
            .into_iter()
            .map(|(name, data)| (name, Application::new(self.client.clone(), data)))
            .collect::<HashMap<_, _>>();

        self.inner.applications.replace(applications.clone());
        Ok(applications)
    }

    /// Create application `name`.
    pub async fn create_application(&self, name: &str) -> Result<Application<T, D>, SpireError> {
        let collection = self.collection("applications")?;
        let data = self
            .client
            .create_in_collection(&collection, "application", NewApplication { name })
            .await?;
        let application = Application::new(self.client.clone(), data);

        self.inner
            .applications
            .insert(name.into(), application.clone());
        Ok(application)
    }

    /// Create application `name` or look up the existing one.
    pub async fn find_or_create_application(
        &self,
        name: &str,
    ) -> Result<Application<T, D>, SpireError> {
        if let Some(application) = self.inner.applications.get(name) {
            return Ok(application);
        }

        let session = self;
        find_or_create(
            "application",
            name,
            &self.inner.application_attempts,
            move || async move { session.create_application(name).await },
            move || async move {
                session
                    .applications_refresh()
                    .await
                    .map(|mut applications| applications.remove(name))
            },
        )
        .await
    }

    /// Account notifications, fetched once.
    pub async fn notifications(
        &self,
    ) -> Result<HashMap<String, Notification<T, D>>, SpireError> {
        match self.inner.notifications.all() {
            Some(notifications) => Ok(notifications),
            None => self.notifications_refresh().await,
        }
    }

    /// Fetch account notifications.
    pub async fn notifications_refresh(
        &self,
    ) -> Result<HashMap<String, Notification<T, D>>, SpireError> {
        let collection = self.collection("notifications")?;
        let notifications = self
            .client
            .list_collection(&collection, "all", "notifications", &[])
            .await?
            .into_iter()
            .map(|(name, data)| (name, Notification::new(self.client.clone(), data)))
            .collect::<HashMap<_, _>>();

        self.inner.notifications.replace(notifications.clone());
        Ok(notifications)
    }

    /// Create notification `name` delivered in `mode` (`development` or
    /// `production`).
    pub async fn create_notification(
        &self,
        name: &str,
        mode: &str,
    ) -> Result<Notification<T, D>, SpireError> {
        let collection = self.collection("notifications")?;
        let data = self
            .client
            .create_in_collection(&collection, "notification", NewNotification { name, mode })
            .await?;
        let notification = Notification::new(self.client.clone(), data);

        self.inner
            .notifications
            .insert(name.into(), notification.clone());
        Ok(notification)
    }

    /// Create notification `name` or look up the existing one.
    pub async fn find_or_create_notification(
        &self,
        name: &str,
        mode: &str,
    ) -> Result<Notification<T, D>, SpireError> {
        if let Some(notification) = self.inner.notifications.get(name) {
            return Ok(notification);
        }

        let session = self;
        find_or_create(
            "notification",
            name,
            &self.inner.notification_attempts,
            move || async move { session.create_notification(name, mode).await },
            move || async move {
                session
                    .notifications_refresh()
                    .await
                    .map(|mut notifications| notifications.remove(name))
            },
        )
        .await
    }

    async fn channel_urls(&self, channel_names: &[&str]) -> Result<Vec<String>, SpireError> {
        let mut channels = self.channels().await?;
        if channel_names.iter().any(|name| !channels.contains_key(*name)) {
            channels = self.channels_refresh().await?;
        }

        channel_names
            .iter()
            .map(|name| {
                channels
                    .get(*name)
                    .map(|channel| channel.url())
                    .ok_or_else(|| SpireError::invalid_argument(format!("unknown channel '{name}'")))
            })
            .collect()
    }
}
