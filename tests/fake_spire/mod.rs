//! In-process spire.io service on top of `wiremock`.
//!
//! Keeps channels, subscriptions and published messages in memory so
//! publishing to a channel is visible to polls of its subscriptions.

#![allow(dead_code)]

use serde_json::{json, Value};
use spire_io::{core::SpireError, SpireClient, SpireClientBuilder};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use wiremock::{
    matchers::{header, method, path, path_regex},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

pub const EVENTS_CAPABILITY: &str = "events-token";

const EVENTS_AUTHORIZATION: &str = "Capability events-token";

const MEDIA_TYPES: [&str; 8] = [
    "session",
    "account",
    "channel",
    "channels",
    "subscription",
    "subscriptions",
    "events",
    "message",
];

/// Delay of a long-poll answer without events.
const EMPTY_POLL_DELAY: Duration = Duration::from_millis(50);

#[derive(Default)]
struct State {
    channels: BTreeMap<String, Value>,
    subscriptions: BTreeMap<String, (Value, Vec<String>)>,
    messages: Vec<(String, u64, Value)>,
    created_channels: usize,
    next_timestamp: u64,
    next_subscription: usize,
}

#[derive(Clone, Copy)]
enum Route {
    Discovery,
    Sessions,
    Channels,
    CreateChannel,
    Publish,
    Subscriptions,
    CreateSubscription,
    Events,
}

struct Handler {
    uri: String,
    route: Route,
    state: Arc<Mutex<State>>,
}

/// Running fake service.
pub struct FakeSpire {
    pub server: MockServer,
    state: Arc<Mutex<State>>,
}

impl FakeSpire {
    pub async fn start() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let fake = Self {
            server: MockServer::start().await,
            state: Default::default(),
        };

        fake.mount(method("GET"), path("/"), Route::Discovery).await;
        fake.mount(method("POST"), path("/sessions"), Route::Sessions).await;
        fake.mount(method("GET"), path("/channels"), Route::Channels).await;
        fake.mount(method("POST"), path("/channels"), Route::CreateChannel).await;
        fake.mount(method("POST"), path_regex(r"^/channel/[^/]+$"), Route::Publish).await;
        fake.mount(method("GET"), path("/subscriptions"), Route::Subscriptions).await;
        fake.mount(method("POST"), path("/subscriptions"), Route::CreateSubscription).await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/subscription/[^/]+$"))
            .and(header("Authorization", EVENTS_AUTHORIZATION))
            .respond_with(fake.handler(Route::Events))
            .mount(&fake.server)
            .await;

        fake
    }

    async fn mount<M, P>(&self, method: M, path: P, route: Route)
    where
        M: wiremock::Match + 'static,
        P: wiremock::Match + 'static,
    {
        Mock::given(method)
            .and(path)
            .respond_with(self.handler(route))
            .mount(&self.server)
            .await;
    }

    fn handler(&self, route: Route) -> Handler {
        Handler {
            uri: self.server.uri(),
            route,
            state: self.state.clone(),
        }
    }

    /// New client pointed at the fake service.
    pub fn client(&self) -> Result<SpireClient, SpireError> {
        SpireClientBuilder::with_reqwest_transport()
            .with_url(self.server.uri())
            .with_long_poll_timeout(1)
            .build()
    }

    /// How many channels have actually been created.
    pub fn created_channels(&self) -> usize {
        self.state.lock().unwrap().created_channels
    }

    /// Requests received for `method` and `path`.
    pub async fn requests_to(&self, method: &str, path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.method.to_string() == method && request.url.path() == path)
            .count()
    }
}

impl Respond for Handler {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = serde_json::from_slice::<Value>(&request.body).unwrap_or(Value::Null);
        let mut state = self.state.lock().unwrap();

        match self.route {
            Route::Discovery => ResponseTemplate::new(200).set_body_json(self.description()),
            Route::Sessions => ResponseTemplate::new(201).set_body_json(self.session()),
            Route::Channels => ResponseTemplate::new(200).set_body_json(&state.channels),
            Route::CreateChannel => {
                let name = body["name"].as_str().unwrap_or_default().to_string();
                if state.channels.contains_key(&name) {
                    return ResponseTemplate::new(409).set_body_json(json!("channel exists"));
                }

                let channel = self.channel(&name);
                state.channels.insert(name, channel.clone());
                state.created_channels += 1;
                ResponseTemplate::new(201).set_body_json(channel)
            }
            Route::Publish => {
                state.next_timestamp += 1;
                let timestamp = state.next_timestamp;
                let url = format!("{}{}", self.uri, request.url.path());
                state
                    .messages
                    .push((url, timestamp, body["content"].clone()));

                ResponseTemplate::new(201).set_body_json(json!({
                    "url": format!("{}/message/{timestamp}", self.uri),
                    "timestamp": timestamp,
                    "content": body["content"]
                }))
            }
            Route::Subscriptions => {
                let subscriptions = state
                    .subscriptions
                    .iter()
                    .map(|(name, (subscription, _))| (name.clone(), subscription.clone()))
                    .collect::<BTreeMap<_, _>>();
                ResponseTemplate::new(200).set_body_json(subscriptions)
            }
            Route::CreateSubscription => {
                let name = match body["name"].as_str() {
                    Some(name) => name.to_string(),
                    None => {
                        state.next_subscription += 1;
                        format!("subscription-{}", state.next_subscription)
                    }
                };
                if state.subscriptions.contains_key(&name) {
                    return ResponseTemplate::new(409).set_body_json(json!("subscription exists"));
                }

                let channels = body["channels"]
                    .as_array()
                    .map(|channels| {
                        channels
                            .iter()
                            .filter_map(|url| url.as_str().map(String::from))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let subscription = self.subscription(&name);
                state
                    .subscriptions
                    .insert(name, (subscription.clone(), channels));
                ResponseTemplate::new(201).set_body_json(subscription)
            }
            Route::Events => self.events(&state, request),
        }
    }
}

impl Handler {
    fn events(&self, state: &State, request: &Request) -> ResponseTemplate {
        let query = request
            .url
            .query_pairs()
            .into_owned()
            .collect::<BTreeMap<_, _>>();
        let last = query
            .get("last")
            .and_then(|last| last.parse::<u64>().ok())
            .unwrap_or_default();
        let timeout = query
            .get("timeout")
            .and_then(|timeout| timeout.parse::<u64>().ok())
            .unwrap_or_default();
        let name = request.url.path().trim_start_matches("/subscription/");
        let Some((_, channels)) = state.subscriptions.get(name) else {
            return ResponseTemplate::new(404).set_body_json(json!("no such subscription"));
        };

        let mut messages = state
            .messages
            .iter()
            .filter(|(channel, timestamp, _)| channels.contains(channel) && *timestamp > last)
            .map(|(_, timestamp, content)| json!({ "timestamp": timestamp, "content": content }))
            .collect::<Vec<_>>();
        if query.get("order-by").map(String::as_str) == Some("desc") {
            messages.reverse();
        }
        let empty = messages.is_empty();

        let response = ResponseTemplate::new(200).set_body_json(json!({
            "first": messages.first().map(|message| message["timestamp"].clone()),
            "last": messages.last().map(|message| message["timestamp"].clone()),
            "messages": messages,
            "joins": [],
            "parts": []
        }));

        if empty && timeout > 0 {
            response.set_delay(EMPTY_POLL_DELAY)
        } else {
            response
        }
    }

    fn description(&self) -> Value {
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
                "sessions": { "url": format!("{}/sessions", self.uri) },
                "accounts": { "url": format!("{}/accounts", self.uri) }
            },
            "schema": { "1.0": schema }
        })
    }

    fn session(&self) -> Value {
        let collection = |name: &str| {
            json!({
                "url": format!("{}/{name}", self.uri),
                "capabilities": {
                    "all": format!("{name}-all"),
                    "create": format!("{name}-create")
                }
            })
        };

        json!({
            "url": format!("{}/session/1", self.uri),
            "capabilities": { "get": "session-get" },
            "resources": {
                "channels": collection("channels"),
                "subscriptions": collection("subscriptions")
            }
        })
    }

    fn channel(&self, name: &str) -> Value {
        json!({
            "url": format!("{}/channel/{name}", self.uri),
            "name": name,
            "capabilities": { "publish": format!("{name}-publish") }
        })
    }

    fn subscription(&self, name: &str) -> Value {
        json!({
            "url": format!("{}/subscription/{name}", self.uri),
            "name": name,
            "capabilities": { "events": EVENTS_CAPABILITY }
        })
    }
}
