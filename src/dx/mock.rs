//! In-memory spire.io service used by unit tests.

use serde_json::{json, Value};
use spin::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    core::{SpireError, Transport, TransportMethod, TransportRequest, TransportResponse},
    dx::SpireClientInstance,
    providers::deserialization_serde::DeserializerSerde,
    transport::SpireMiddleware,
    SpireClientBuilder,
};

pub(crate) const BASE: &str = "http://spire.test";

pub(crate) type MockClient = SpireClientInstance<SpireMiddleware<MockTransport>, DeserializerSerde>;

const MEDIA_TYPES: [&str; 14] = [
    "session",
    "account",
    "channel",
    "channels",
    "subscription",
    "subscriptions",
    "events",
    "message",
    "application",
    "applications",
    "member",
    "members",
    "notification",
    "notifications",
];

pub(crate) fn description_json() -> Value {
    let schema = MEDIA_TYPES
        .iter()
        .map(|name| {
            (
                name.to_string(),
                json!({
                    "mediaType": format!("application/vnd.spire-io.{name}+json;version=1.0"),
                    "properties": {}
                }),
            )
        })
        .collect::<serde_json::Map<_, _>>();

    json!({
        "resources": {
            "sessions": { "url": format!("{BASE}/sessions") },
            "accounts": { "url": format!("{BASE}/accounts") }
        },
        "schema": { "1.0": schema }
    })
}

/// Transport answering with responses registered per method and URL.
///
/// Responses registered for the same route are returned in order, the last
/// one is repeated. Unknown routes are answered with `404`.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    routes: Arc<Mutex<HashMap<String, VecDeque<(u16, Value)>>>>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
}

fn route(method: TransportMethod, url: &str) -> String {
    format!("{method} {url}")
}

impl MockTransport {
    /// Replace responses of the route.
    pub fn on(&self, method: TransportMethod, url: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .insert(route(method, url), VecDeque::from([(status, body)]));
    }

    /// Queue one more response for the route.
    pub fn then(&self, method: TransportMethod, url: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .entry(route(method, url))
            .or_default()
            .push_back((status, body));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: TransportMethod, url: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.url == url)
            .collect()
    }

    pub fn last_request(&self, method: TransportMethod) -> Option<TransportRequest> {
        self.requests
            .lock()
            .iter()
            .rev()
            .find(|request| request.method == method)
            .cloned()
    }

    fn respond(&self, request: &TransportRequest) -> (u16, Value) {
        let mut routes = self.routes.lock();
        match routes.get_mut(&route(request.method, &request.url)) {
            Some(responses) if responses.len() > 1 => responses.pop_front().unwrap(),
            Some(responses) => responses.front().cloned().unwrap(),
            None => (404, json!("not found")),
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, SpireError> {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        let (status, body) = self.respond(&request);
        self.requests.lock().push(request);

        Ok(TransportResponse {
            status,
            headers: HashMap::new(),
            body: match body {
                Value::Null => None,
                body => Some(serde_json::to_vec(&body).unwrap()),
            },
        })
    }
}

/// Client with discovery already registered.
pub(crate) fn client() -> (MockClient, MockTransport) {
    let transport = MockTransport::default();
    transport.on(TransportMethod::Get, BASE, 200, description_json());

    let client = SpireClientBuilder::with_transport(transport.clone())
        .with_url(BASE)
        .build()
        .unwrap();

    (client, transport)
}

/// Properties of a collection with every capability.
pub(crate) fn collection_json(url: &str, prefix: &str) -> Value {
    json!({
        "url": url,
        "capabilities": {
            "all": format!("{prefix}-all"),
            "create": format!("{prefix}-create"),
            "get_by_name": format!("{prefix}-by-name"),
            "get_by_login": format!("{prefix}-by-login")
        }
    })
}

/// Channel with publish and subscribe capabilities.
pub(crate) fn channel_json(name: &str) -> Value {
    json!({
        "url": format!("{BASE}/channel/{name}"),
        "name": name,
        "capabilities": {
            "get": format!("{name}-get"),
            "update": format!("{name}-update"),
            "delete": format!("{name}-delete"),
            "publish": format!("{name}-publish")
        },
        "resources": {
            "subscriptions": {
                "url": format!("{BASE}/channel/{name}/subscriptions"),
                "capabilities": {
                    "create": format!("{name}-subscribe"),
                    "get_subscriptions": format!("{name}-subscriptions")
                }
            }
        }
    })
}

/// Subscription with events capability.
pub(crate) fn subscription_json(name: &str) -> Value {
    json!({
        "url": format!("{BASE}/subscription/{name}"),
        "name": name,
        "capabilities": {
            "get": format!("{name}-get"),
            "delete": format!("{name}-delete"),
            "events": format!("{name}-events")
        }
    })
}

/// Session with every collection.
pub(crate) fn session_json() -> Value {
    json!({
        "url": format!("{BASE}/session/1"),
        "capabilities": { "get": "session-get" },
        "resources": {
            "account": {
                "url": format!("{BASE}/account/1"),
                "capabilities": { "get": "account-get", "update": "account-update" }
            },
            "channels": collection_json(&format!("{BASE}/channels"), "channels"),
            "subscriptions": collection_json(&format!("{BASE}/subscriptions"), "subscriptions"),
            "applications": collection_json(&format!("{BASE}/applications"), "applications"),
            "notifications": collection_json(&format!("{BASE}/notifications"), "notifications")
        }
    })
}

/// Events batch in the shape returned by the service.
pub(crate) fn events_json(messages: &[(u64, &str)]) -> Value {
    let messages = messages
        .iter()
        .map(|(timestamp, content)| json!({ "timestamp": timestamp, "content": content }))
        .collect::<Vec<_>>();

    json!({
        "first": messages.first().map(|message| message["timestamp"].clone()),
        "last": messages.last().map(|message| message["timestamp"].clone()),
        "messages": messages,
        "joins": [],
        "parts": []
    })
}
