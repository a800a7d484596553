//! # Listeners registry
//!
//! Named callbacks attached to a subscription for a specific event type.

use futures::future::BoxFuture;
use rand::Rng;
use spin::Mutex;
use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::dx::subscribe::{Event, EventType};

/// Callback invoked with every event of the type it has been registered for.
pub type ListenerCallback = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifies a listener to remove.
#[derive(Clone)]
pub enum ListenerKey {
    /// Name returned when the listener has been added.
    Name(String),

    /// The callback which has been registered.
    Callback(ListenerCallback),
}

impl Debug for ListenerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "ListenerKey::Name({name})"),
            Self::Callback(_) => write!(f, "ListenerKey::Callback"),
        }
    }
}

impl From<&str> for ListenerKey {
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl From<String> for ListenerKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<ListenerCallback> for ListenerKey {
    fn from(callback: ListenerCallback) -> Self {
        Self::Callback(callback)
    }
}

impl From<&ListenerCallback> for ListenerKey {
    fn from(callback: &ListenerCallback) -> Self {
        Self::Callback(Arc::clone(callback))
    }
}

type Listeners = HashMap<EventType, HashMap<String, ListenerCallback>>;

/// Listeners of a single subscription.
///
/// Every access goes through one lock, dispatch works on snapshots so
/// listeners can be added and removed while events are delivered.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Listeners>,
}

impl Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_map()
            .entries(
                listeners
                    .iter()
                    .map(|(event_type, listeners)| (event_type, listeners.keys().collect::<Vec<_>>())),
            )
            .finish()
    }
}

impl ListenerRegistry {
    /// Register `callback`, replacing a listener with the same name.
    ///
    /// When `name` is missing a new one is generated which isn't used by any
    /// listener of any type.
    pub fn add(
        &self,
        event_type: EventType,
        name: Option<String>,
        callback: ListenerCallback,
    ) -> String {
        let mut listeners = self.listeners.lock();
        let name = name.unwrap_or_else(|| generate_name(&listeners));

        listeners
            .entry(event_type)
            .or_default()
            .insert(name.clone(), callback);

        name
    }

    /// Unregister listener matching `key`.
    pub fn remove(
        &self,
        event_type: EventType,
        key: &ListenerKey,
    ) -> Option<(String, ListenerCallback)> {
        let mut listeners = self.listeners.lock();
        let of_type = listeners.get_mut(&event_type)?;

        let name = match key {
            ListenerKey::Name(name) => name.clone(),
            ListenerKey::Callback(callback) => of_type
                .iter()
                .find(|(_, registered)| Arc::ptr_eq(registered, callback))
                .map(|(name, _)| name.clone())?,
        };

        of_type
            .remove(&name)
            .map(|callback| (name, callback))
    }

    /// Unregister every listener and return their names.
    pub fn clear(&self) -> Vec<String> {
        self.listeners
            .lock()
            .drain()
            .flat_map(|(_, listeners)| listeners.into_keys())
            .collect()
    }

    /// Listeners of `event_type` at this moment.
    pub fn snapshot(&self, event_type: EventType) -> Vec<(String, ListenerCallback)> {
        self.listeners
            .lock()
            .get(&event_type)
            .map(|listeners| {
                listeners
                    .iter()
                    .map(|(name, callback)| (name.clone(), Arc::clone(callback)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of `event_type` listeners.
    pub fn names(&self, event_type: EventType) -> Vec<String> {
        let mut names = self
            .listeners
            .lock()
            .get(&event_type)
            .map(|listeners| listeners.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        names.sort();
        names
    }
}

fn generate_name(listeners: &Listeners) -> String {
    let mut rng = rand::thread_rng();

    loop {
        let name = format!("Listener-{}", rng.gen_range(0..9_999_999));
        if !listeners.values().any(|names| names.contains_key(&name)) {
            break name;
        }
    }
}
