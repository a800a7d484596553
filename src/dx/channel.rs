//! # Channel
//!
//! Channels are the write side of the pub/sub service: messages are published
//! to a channel and received by its subscriptions.

use log::debug;
use serde::Serialize;
use std::{collections::HashMap, ops::Deref, sync::Arc};

use crate::{
    core::{Deserializer, SpireError, Transport},
    dx::{
        request,
        resource::{Resource, ResourceCache, ResourceData},
        subscribe::{Message, Subscription},
        SpireClientInstance,
    },
};

/// Channel handle.
#[derive(Debug)]
pub struct Channel<T, D> {
    resource: Resource<T, D>,
    subscriptions: Arc<ResourceCache<Subscription<T, D>>>,
}

#[derive(Serialize)]
struct Publish<C> {
    content: C,
}

#[derive(Serialize)]
struct Subscribe<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<T, D> Channel<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            resource: Resource::new(client, "channel", data),
            subscriptions: Default::default(),
        }
    }
}

impl<T, D> Clone for Channel<T, D> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            subscriptions: Arc::clone(&self.subscriptions),
        }
    }
}

impl<T, D> Deref for Channel<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T, D> Channel<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Publish `content` to the channel.
    ///
    /// Returns the created message.
    pub async fn publish<C>(&self, content: C) -> Result<Message, SpireError>
    where
        C: Serialize,
    {
        let media_type = self.client.media_type("message").await?;
        let request = request::create(
            &self.url(),
            Some(self.capability("publish")?.as_str()),
            Some((&media_type, &media_type)),
            Publish { content },
        )?;

        let message: Message = self.client.execute(request, request::CREATED_STATUS).await?;
        debug!("Published message {} to {}", message.timestamp, self.url());
        Ok(message)
    }

    /// Create a subscription on this channel.
    pub async fn subscribe(&self, name: Option<&str>) -> Result<Subscription<T, D>, SpireError> {
        let collection = self.collection("subscriptions")?;
        let data = self
            .client
            .create_in_collection(&collection, "subscription", Subscribe { name })
            .await?;
        let subscription = Subscription::new(self.client.clone(), data);

        if let Some(name) = subscription.name() {
            self.subscriptions.insert(name, subscription.clone());
        }

        Ok(subscription)
    }

    /// Subscriptions on this channel, fetched once.
    pub async fn subscriptions(&self) -> Result<HashMap<String, Subscription<T, D>>, SpireError> {
        match self.subscriptions.all() {
            Some(subscriptions) => Ok(subscriptions),
            None => self.subscriptions_refresh().await,
        }
    }

    /// Fetch subscriptions on this channel.
    ///
    /// Handles of subscriptions which were already known are kept, so their
    /// cursor and listeners carry over.
    pub async fn subscriptions_refresh(
        &self,
    ) -> Result<HashMap<String, Subscription<T, D>>, SpireError> {
        let collection = self.collection("subscriptions")?;
        let listing = self
            .client
            .list_collection(&collection, "get_subscriptions", "subscriptions", &[])
            .await?;
        let subscriptions = Subscription::from_listing(
            &self.client,
            self.subscriptions.all().unwrap_or_default(),
            listing,
        );

        self.subscriptions.replace(subscriptions.clone());
        Ok(subscriptions)
    }
}
