//! # Subscription events
//!
//! Events are received in batches by polling a subscription. Every event has
//! a `timestamp` which orders it within the subscription and is used as the
//! cursor for the next poll.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::{fmt::Display, str::FromStr};

use crate::core::SpireError;

/// Kind of subscription event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    /// Message published to a channel.
    Message,

    /// Subscription joined a channel.
    Join,

    /// Subscription left a channel.
    Part,
}

impl EventType {
    /// All known event types.
    pub const ALL: [EventType; 3] = [EventType::Message, EventType::Join, EventType::Part];

    /// Event type name used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Message => "message",
            EventType::Join => "join",
            EventType::Part => "part",
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = SpireError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "message" => Ok(EventType::Message),
            "join" => Ok(EventType::Join),
            "part" => Ok(EventType::Part),
            _ => Err(SpireError::invalid_argument(format!(
                "listener type must be one of message, join, part (got '{value}')"
            ))),
        }
    }
}

/// Message published to a channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    /// Message timestamp.
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: u64,

    /// Published content.
    #[serde(default)]
    pub content: Value,

    /// Remaining message properties (`url`, `channel`, ...).
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Notification about a subscription joining a channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Join {
    /// Event timestamp.
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: u64,

    /// Remaining event properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Notification about a subscription leaving a channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Part {
    /// Event timestamp.
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: u64,

    /// Remaining event properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Subscription event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Message published to a channel.
    Message(Message),

    /// Subscription joined a channel.
    Join(Join),

    /// Subscription left a channel.
    Part(Part),
}

impl Event {
    /// Event timestamp.
    pub fn timestamp(&self) -> u64 {
        match self {
            Event::Message(message) => message.timestamp,
            Event::Join(join) => join.timestamp,
            Event::Part(part) => part.timestamp,
        }
    }

    /// Event type.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Message(_) => EventType::Message,
            Event::Join(_) => EventType::Join,
            Event::Part(_) => EventType::Part,
        }
    }

    /// Message content (only for [`Event::Message`]).
    pub fn content(&self) -> Option<&Value> {
        match self {
            Event::Message(message) => Some(&message.content),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl RawTimestamp {
    fn into_timestamp<E>(self) -> Result<u64, E>
    where
        E: serde::de::Error,
    {
        match self {
            RawTimestamp::Integer(value) => Ok(value),
            RawTimestamp::Float(value) if value >= 0.0 && value.fract() == 0.0 => {
                Ok(value as u64)
            }
            RawTimestamp::Float(value) => Err(E::custom(format!("invalid timestamp {value}"))),
            RawTimestamp::Text(value) => value
                .parse()
                .map_err(|_| E::custom(format!("malformed timestamp '{value}'"))),
        }
    }
}

/// Timestamps are sent either as numbers or as numeric strings.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    RawTimestamp::deserialize(deserializer)?.into_timestamp()
}

pub(crate) fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match deserializer.deserialize_option(OptionVisitor)? {
        Some(raw) => raw.into_timestamp().map(Some),
        None => Ok(None),
    }
}

struct OptionVisitor;

impl<'de> serde::de::Visitor<'de> for OptionVisitor {
    type Value = Option<RawTimestamp>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("optional timestamp")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawTimestamp::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("message" => Ok(EventType::Message); "message")]
    #[test_case("JOIN" => Ok(EventType::Join); "upper case join")]
    #[test_case("part" => Ok(EventType::Part); "part")]
    fn parse_event_type(value: &str) -> Result<EventType, SpireError> {
        value.parse()
    }

    #[test]
    fn reject_unknown_event_type() {
        let result = "presence".parse::<EventType>();

        assert!(matches!(result, Err(SpireError::InvalidArgument { .. })));
    }

    #[test_case(json!(15) => 15; "numeric")]
    #[test_case(json!("16") => 16; "string")]
    #[test_case(json!(17.0) => 17; "float")]
    fn deserialize_message_timestamp(timestamp: Value) -> u64 {
        let message: Message = serde_json::from_value(json!({
            "timestamp": timestamp,
            "content": "Message 1"
        }))
        .unwrap();

        message.timestamp
    }

    #[test]
    fn keep_remaining_properties() {
        let message: Message = serde_json::from_value(json!({
            "url": "https://api.spire.io/message/1",
            "timestamp": 1,
            "content": { "text": "hi" }
        }))
        .unwrap();

        assert_eq!(message.content, json!({ "text": "hi" }));
        assert_eq!(
            message.properties.get("url"),
            Some(&json!("https://api.spire.io/message/1"))
        );
        assert!(!message.properties.contains_key("timestamp"));
    }

    #[test_case(json!("soon"); "malformed")]
    #[test_case(json!(-3); "negative")]
    #[test_case(json!(1.5); "fractional")]
    fn reject_invalid_timestamp(timestamp: Value) {
        let result = serde_json::from_value::<Join>(json!({ "timestamp": timestamp }));

        assert!(result.is_err());
    }
}
