//! # Subscription events types
//!
//! Options of an events request and the batch of events it returns.

use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;

use crate::dx::subscribe::{
    event::optional_timestamp, Event, EventType, Join, Message, Part, SubscriptionCursor,
};

/// Order in which events are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    /// Oldest events first.
    #[default]
    Asc,

    /// Newest events first.
    Desc,
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OrderBy::Asc => "asc",
                OrderBy::Desc => "desc",
            }
        )
    }
}

/// Parameters of an events request.
///
/// Unset values are not sent and the service defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsOptions {
    /// How long (in seconds) the service may wait for new events. `0` returns
    /// immediately.
    pub timeout: Option<u64>,

    /// Maximum number of events in the batch.
    pub limit: Option<u64>,

    /// Oldest event timestamp to include.
    pub min_timestamp: Option<u64>,

    /// Newest event timestamp to include.
    pub max_timestamp: Option<u64>,

    /// Delay (in seconds) before the service responds.
    pub delay: Option<u64>,

    /// Only events newer than this cursor are returned.
    pub last: Option<SubscriptionCursor>,

    /// Order of events.
    pub order_by: OrderBy,
}

/// Body of the events response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventsResponse {
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub first: Option<u64>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub last: Option<u64>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub joins: Vec<Join>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Events received with a single poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsBatch {
    /// Timestamp of the first event reported by the service.
    pub first: Option<u64>,

    /// Timestamp of the last event reported by the service.
    pub last: Option<u64>,

    /// Events of all types ordered by timestamp in the requested direction.
    pub events: Vec<Event>,

    /// Subscription cursor after the batch has been received.
    pub cursor: SubscriptionCursor,
}

impl EventsBatch {
    pub(crate) fn new(response: EventsResponse, order_by: OrderBy) -> Self {
        let mut events = response
            .messages
            .into_iter()
            .map(Event::Message)
            .chain(response.joins.into_iter().map(Event::Join))
            .chain(response.parts.into_iter().map(Event::Part))
            .collect::<Vec<_>>();

        match order_by {
            OrderBy::Asc => events.sort_by_key(Event::timestamp),
            OrderBy::Desc => events.sort_by_key(|event| std::cmp::Reverse(event.timestamp())),
        }

        Self {
            first: response.first,
            last: response.last,
            events,
            cursor: SubscriptionCursor::default(),
        }
    }

    /// Whether the batch has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Highest event timestamp in the batch.
    pub fn max_timestamp(&self) -> Option<u64> {
        self.events.iter().map(Event::timestamp).max()
    }

    /// Events of type `event_type`.
    pub fn of_type(&self, event_type: EventType) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(move |event| event.event_type() == event_type)
    }

    /// Received messages.
    pub fn messages(&self) -> Vec<&Message> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Content of received messages.
    pub fn contents(&self) -> Vec<Value> {
        self.messages()
            .into_iter()
            .map(|message| message.content.clone())
            .collect()
    }

    /// Received join notifications.
    pub fn joins(&self) -> Vec<&Join> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Join(join) => Some(join),
                _ => None,
            })
            .collect()
    }

    /// Received part notifications.
    pub fn parts(&self) -> Vec<&Part> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Part(part) => Some(part),
                _ => None,
            })
            .collect()
    }
}
