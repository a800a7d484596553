//! # Subscription
//!
//! Read side of one or more channels. Events are received by polling the
//! subscription, either explicitly or by a listening loop which delivers them
//! to registered listeners.

use futures::{select_biased, FutureExt};
use log::{debug, error, info};
use serde_json::Value;
use spin::{Mutex, RwLock};
use std::{
    collections::HashMap,
    future::Future,
    ops::Deref,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    core::{cancel::CancellationTask, Deserializer, SpireError, Transport},
    dx::{
        request,
        resource::{Resource, ResourceData},
        subscribe::{
            dispatch::InFlightInvocations,
            listeners::{ListenerCallback, ListenerKey, ListenerRegistry},
            types::EventsResponse,
            Event, EventType, EventsBatch, EventsOptions, SubscriptionCursor,
        },
        SpireClientInstance,
    },
};

/// Subscription handle.
///
/// Clones share cursor, received messages, listeners and listening state.
///
/// # Examples
/// ```no_run
/// # use spire_io::{core::SpireError, SpireClientBuilder};
/// # #[tokio::main]
/// # async fn main() -> Result<(), SpireError> {
/// let spire = SpireClientBuilder::with_reqwest_transport()
///     .with_default_url()
///     .build()?;
/// let session = spire.create_session("account secret").await?;
/// let subscription = session.find_or_create_subscription("feed", &["news"]).await?;
///
/// subscription.add_listener("message", None, |event| async move {
///     println!("{:?}", event.content());
/// })?;
/// subscription.start_listening()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Subscription<T, D> {
    resource: Resource<T, D>,
    state: Arc<SubscriptionState>,
}

#[derive(Debug, Default)]
struct SubscriptionState {
    cursor: RwLock<SubscriptionCursor>,
    messages: RwLock<Vec<Value>>,
    listeners: ListenerRegistry,
    invocations: Arc<InFlightInvocations>,
    listening: Mutex<Option<ListeningHandle>>,
    generation: AtomicU64,
    last_error: RwLock<Option<SpireError>>,
}

/// Handle of the running listening loop.
#[derive(Debug)]
struct ListeningHandle {
    generation: u64,
    cancel_tx: async_channel::Sender<u64>,
}

impl<T, D> Clone for Subscription<T, D> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, D> Deref for Subscription<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T, D> Subscription<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            resource: Resource::new(client, "subscription", data),
            state: Default::default(),
        }
    }

    /// Handles for a fetched subscription listing.
    ///
    /// Subscriptions found in `cached` under the same URL keep their handle
    /// with refreshed data, so cursor, listeners and a running listening loop
    /// carry over.
    pub(crate) fn from_listing(
        client: &SpireClientInstance<T, D>,
        mut cached: HashMap<String, Self>,
        listing: HashMap<String, ResourceData>,
    ) -> HashMap<String, Self> {
        listing
            .into_iter()
            .map(|(name, data)| {
                let subscription = match cached.remove(&name) {
                    Some(subscription) if subscription.url() == data.url => {
                        subscription.replace_data(data);
                        subscription
                    }
                    _ => Self::new(client.clone(), data),
                };

                (name, subscription)
            })
            .collect()
    }

    /// Timestamp of the most recent event received.
    pub fn cursor(&self) -> SubscriptionCursor {
        *self.state.cursor.read()
    }

    /// Content of every message received through this handle, oldest first.
    ///
    /// History is kept for the life of the subscription state and is never
    /// trimmed, so a long running listening loop keeps growing it.
    pub fn messages(&self) -> Vec<Value> {
        self.state.messages.read().clone()
    }

    /// Register `listener` for events of `event_type` (`message`, `join` or
    /// `part`).
    ///
    /// Returns the listener name which is `name` or a generated one.
    /// Registering a listener with a name which is already used replaces the
    /// previous one.
    ///
    /// # Errors
    /// [`SpireError::InvalidArgument`] for unknown event type.
    pub fn add_listener<F, Fut>(
        &self,
        event_type: &str,
        name: Option<&str>,
        listener: F,
    ) -> Result<String, SpireError>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_listener_callback(
            event_type,
            name,
            Arc::new(move |event: Event| listener(event).boxed()),
        )
    }

    /// Register `callback` for events of `event_type`.
    ///
    /// Same as [`Subscription::add_listener`] but keeps callback identity so
    /// it can be used as [`ListenerKey::Callback`] later.
    pub fn add_listener_callback(
        &self,
        event_type: &str,
        name: Option<&str>,
        callback: ListenerCallback,
    ) -> Result<String, SpireError> {
        let event_type = event_type.parse::<EventType>()?;
        let name = self
            .state
            .listeners
            .add(event_type, name.map(String::from), callback);

        debug!("Added {event_type} listener '{name}' to {}", self.url());
        Ok(name)
    }

    /// Remove `event_type` listener identified by `key`.
    ///
    /// When `cancel_in_flight` is set, invocations of the listener which are
    /// still running are cancelled.
    ///
    /// Returns removed callback.
    ///
    /// # Errors
    /// [`SpireError::InvalidArgument`] for unknown event type.
    pub fn remove_listener<K>(
        &self,
        event_type: &str,
        key: K,
        cancel_in_flight: bool,
    ) -> Result<Option<ListenerCallback>, SpireError>
    where
        K: Into<ListenerKey>,
    {
        let event_type = event_type.parse::<EventType>()?;
        let Some((name, callback)) = self.state.listeners.remove(event_type, &key.into()) else {
            return Ok(None);
        };

        if cancel_in_flight {
            self.state.invocations.cancel(event_type, &name);
        }

        debug!("Removed {event_type} listener '{name}' from {}", self.url());
        Ok(Some(callback))
    }

    /// Remove every listener.
    ///
    /// Returns names of removed listeners.
    pub fn remove_all_listeners(&self, cancel_in_flight: bool) -> Vec<String> {
        let names = self.state.listeners.clear();

        if cancel_in_flight {
            self.state.invocations.cancel_all();
        }

        names
    }

    /// Names of listeners registered for `event_type`.
    pub fn listener_names(&self, event_type: EventType) -> Vec<String> {
        self.state.listeners.names(event_type)
    }

    /// Number of listener invocations still running.
    pub fn in_flight_invocations(&self) -> usize {
        self.state.invocations.len()
    }

    /// Whether listening loop is running.
    pub fn is_listening(&self) -> bool {
        self.state.listening.lock().is_some()
    }

    /// Error which stopped the last listening loop.
    pub fn last_listening_error(&self) -> Option<SpireError> {
        self.state.last_error.read().clone()
    }

    /// Stop the listening loop.
    ///
    /// The in-flight long-poll request is abandoned and events it may still
    /// return aren't delivered. When `cancel_in_flight` is set, running
    /// listener invocations are cancelled as well.
    ///
    /// Returns `false` when the subscription wasn't listening.
    pub fn stop_listening(&self, cancel_in_flight: bool) -> bool {
        let handle = self.state.listening.lock().take();

        if cancel_in_flight {
            self.state.invocations.cancel_all();
        }

        let Some(handle) = handle else {
            return false;
        };

        if handle.cancel_tx.try_send(handle.generation).is_err() {
            debug!("Listening loop {} already finished", handle.generation);
        }

        info!("Stopped listening on {}", self.url());
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state
            .listening
            .lock()
            .as_ref()
            .map(|handle| handle.generation)
            == Some(generation)
    }

    fn finish(&self, generation: u64, error: SpireError) {
        let mut listening = self.state.listening.lock();
        if listening.as_ref().map(|handle| handle.generation) == Some(generation) {
            *listening = None;
        }

        *self.state.last_error.write() = Some(error);
    }

    /// Deliver `batch` unless listening loop `generation` has been stopped.
    ///
    /// Invocations are spawned under the listening lock, so a concurrent
    /// [`Subscription::stop_listening`] either prevents them or cancels them.
    fn dispatch_if_current(&self, generation: u64, batch: &EventsBatch) -> bool {
        let listening = self.state.listening.lock();
        if listening.as_ref().map(|handle| handle.generation) != Some(generation) {
            return false;
        }

        self.dispatch(batch);
        true
    }

    fn dispatch(&self, batch: &EventsBatch) {
        let runtime = &self.client.runtime;

        for event in &batch.events {
            for (name, callback) in self.state.listeners.snapshot(event.event_type()) {
                self.state
                    .invocations
                    .spawn(runtime, name, callback, event.clone());
            }
        }
    }
}

impl<T, D> Subscription<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Fetch subscription events.
    ///
    /// The cursor moves to the highest timestamp of a non-empty batch and
    /// never moves back.
    ///
    /// # Errors
    /// [`SpireError::Remote`] when the service doesn't respond with `200`.
    pub async fn retrieve_events(&self, options: EventsOptions) -> Result<EventsBatch, SpireError> {
        let transport = &self.client.config.transport;
        let timeout = match options.timeout {
            Some(0) => 0,
            Some(timeout) => timeout + transport.long_poll_grace,
            None => transport.long_poll_timeout + transport.long_poll_grace,
        };

        let media_type = self.client.media_type("events").await?;
        let request = request::events(
            &self.url(),
            &self.capability("events")?,
            &media_type,
            &options,
            timeout,
        );
        let response: EventsResponse = self.client.execute(request, 200).await?;
        let mut batch = EventsBatch::new(response, options.order_by);

        batch.cursor = {
            let mut cursor = self.state.cursor.write();
            cursor.advance(batch.max_timestamp());
            *cursor
        };
        self.state.messages.write().extend(batch.contents());

        debug!(
            "Received {} events from {} (cursor: {})",
            batch.events.len(),
            self.url(),
            batch.cursor
        );

        Ok(batch)
    }

    /// Fetch events available right now.
    pub async fn poll(&self) -> Result<EventsBatch, SpireError> {
        self.retrieve_events(EventsOptions {
            timeout: Some(0),
            last: Some(self.cursor()),
            ..Default::default()
        })
        .await
    }

    /// Wait for new events up to the configured long-poll timeout.
    pub async fn long_poll(&self) -> Result<EventsBatch, SpireError> {
        self.retrieve_events(EventsOptions {
            timeout: Some(self.client.config.transport.long_poll_timeout),
            last: Some(self.cursor()),
            ..Default::default()
        })
        .await
    }

    /// Start delivering events to listeners.
    ///
    /// Listening runs long-poll requests back to back in a task spawned on
    /// the client runtime. Every listener invocation runs in its own task so
    /// slow listeners don't hold back polling or each other.
    ///
    /// A failed poll stops listening, the error is available with
    /// [`Subscription::last_listening_error`].
    ///
    /// # Errors
    /// [`SpireError::AlreadyListening`] when listening has been started
    /// already.
    pub fn start_listening(&self) -> Result<(), SpireError> {
        let (generation, cancel_rx) = {
            let mut listening = self.state.listening.lock();
            if listening.is_some() {
                return Err(SpireError::AlreadyListening);
            }

            let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let (cancel_tx, cancel_rx) = async_channel::bounded(1);
            *listening = Some(ListeningHandle {
                generation,
                cancel_tx,
            });

            (generation, cancel_rx)
        };
        *self.state.last_error.write() = None;

        info!("Started listening on {}", self.url());

        let subscription = self.clone();
        self.client.runtime.spawn(async move {
            subscription
                .listen(generation, CancellationTask::new(cancel_rx, generation))
                .await
        });

        Ok(())
    }

    async fn listen(self, generation: u64, cancel_task: CancellationTask) {
        while self.is_current(generation) {
            let result = select_biased! {
                _ = cancel_task.wait_for_cancel().fuse() => None,
                result = self.long_poll().fuse() => Some(result),
            };
            let Some(result) = result else {
                break;
            };

            match result {
                Ok(batch) if self.dispatch_if_current(generation, &batch) => {}
                Ok(_) => break,
                Err(err) => {
                    error!("Listening on {} failed: {err}", self.url());
                    self.finish(generation, err);
                    break;
                }
            }
        }

        debug!("Listening loop {generation} on {} finished", self.url());
    }
}
