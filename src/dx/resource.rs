//! # Capability-authenticated resources
//!
//! Every object of the spire.io API (account, channel, subscription,
//! application, member, notification) is addressed by an absolute URL and
//! guarded by a set of capabilities: secret tokens granting one operation
//! each. This module contains [`Resource`] which wraps that state and the
//! generic `get` / `update` / `delete` operations.

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use spin::RwLock;
use std::{collections::HashMap, sync::Arc};

use crate::{
    core::{Deserializer, Serialize, SpireError, Transport},
    dx::{request, SpireClientInstance},
};

/// Snapshot of resource state returned by the service.
///
/// `url` and `capabilities` are extracted from the properties for
/// convenience, `properties` keeps the whole object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ResourceData {
    /// Absolute resource URL.
    pub url: String,

    /// Capability token for every operation allowed on this resource.
    pub capabilities: HashMap<String, String>,

    /// All resource properties.
    pub properties: Map<String, Value>,
}

impl From<Map<String, Value>> for ResourceData {
    fn from(properties: Map<String, Value>) -> Self {
        let url = properties
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            url,
            capabilities: capabilities(properties.get("capabilities")),
            properties,
        }
    }
}

fn capabilities(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|capabilities| {
            capabilities
                .iter()
                .filter_map(|(operation, token)| {
                    token.as_str().map(|token| (operation.clone(), token.into()))
                })
                .collect()
        })
        .unwrap_or_default()
}

impl ResourceData {
    /// Capability token for `operation`.
    pub fn capability(&self, operation: &str) -> Result<&str, SpireError> {
        self.capabilities
            .get(operation)
            .map(String::as_str)
            .ok_or_else(|| SpireError::schema(format!("no '{operation}' capability for {}", self.url)))
    }

    /// Nested collection `name` listed under `resources`.
    pub fn collection(&self, name: &str) -> Result<Collection, SpireError> {
        self.properties
            .get("resources")
            .and_then(|resources| resources.get(name))
            .and_then(Value::as_object)
            .map(|collection| Collection::from(collection.clone()))
            .ok_or_else(|| SpireError::schema(format!("no '{name}' collection for {}", self.url)))
    }

    /// Nested resource `name` listed under `resources`.
    pub fn resource(&self, name: &str) -> Result<ResourceData, SpireError> {
        self.properties
            .get("resources")
            .and_then(|resources| resources.get(name))
            .and_then(Value::as_object)
            .map(|resource| ResourceData::from(resource.clone()))
            .ok_or_else(|| SpireError::schema(format!("no '{name}' resource for {}", self.url)))
    }

    /// Value of the string property `name`.
    pub fn string(&self, name: &str) -> Option<String> {
        self.properties
            .get(name)
            .and_then(Value::as_str)
            .map(String::from)
    }
}

/// Collection of resources (channels, subscriptions, members, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    /// Absolute collection URL.
    pub url: String,

    /// Capability token for every operation allowed on this collection.
    pub capabilities: HashMap<String, String>,
}

impl From<Map<String, Value>> for Collection {
    fn from(properties: Map<String, Value>) -> Self {
        let data = ResourceData::from(properties);

        Self {
            url: data.url,
            capabilities: data.capabilities,
        }
    }
}

impl Collection {
    /// Capability token for `operation`.
    pub fn capability(&self, operation: &str) -> Result<&str, SpireError> {
        self.capabilities
            .get(operation)
            .map(String::as_str)
            .ok_or_else(|| SpireError::schema(format!("no '{operation}' capability for {}", self.url)))
    }
}

/// Lazily loaded resources of a collection keyed by name.
#[derive(Debug)]
pub(crate) struct ResourceCache<R> {
    entries: RwLock<Option<HashMap<String, R>>>,
}

impl<R> Default for ResourceCache<R> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(None),
        }
    }
}

impl<R> ResourceCache<R>
where
    R: Clone,
{
    /// All entries, `None` until the collection has been fetched.
    pub fn all(&self) -> Option<HashMap<String, R>> {
        self.entries.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<R> {
        self.entries
            .read()
            .as_ref()
            .and_then(|entries| entries.get(name).cloned())
    }

    pub fn replace(&self, entries: HashMap<String, R>) {
        *self.entries.write() = Some(entries);
    }

    /// Add `resource` if the collection has been fetched already.
    pub fn insert(&self, name: String, resource: R) {
        if let Some(entries) = self.entries.write().as_mut() {
            entries.insert(name, resource);
        }
    }
}

/// Resource handle.
///
/// Handles are cheap to clone and clones share the last known state.
#[derive(Debug)]
pub struct Resource<T, D> {
    pub(crate) client: SpireClientInstance<T, D>,
    kind: &'static str,
    data: Arc<RwLock<ResourceData>>,
}

impl<T, D> Clone for Resource<T, D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            kind: self.kind,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T, D> Resource<T, D> {
    pub(crate) fn new(
        client: SpireClientInstance<T, D>,
        kind: &'static str,
        data: ResourceData,
    ) -> Self {
        Self {
            client,
            kind,
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Schema name of the resource kind.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Absolute resource URL.
    pub fn url(&self) -> String {
        self.data.read().url.clone()
    }

    /// Last known state.
    pub fn data(&self) -> ResourceData {
        self.data.read().clone()
    }

    /// Last known properties.
    pub fn properties(&self) -> Map<String, Value> {
        self.data.read().properties.clone()
    }

    /// Last known value of the property `name`.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.data.read().properties.get(name).cloned()
    }

    /// Resource name.
    pub fn name(&self) -> Option<String> {
        self.data.read().string("name")
    }

    /// Resource key.
    pub fn key(&self) -> Option<String> {
        self.data.read().string("key")
    }

    /// Capability token for `operation`.
    pub fn capability(&self, operation: &str) -> Result<String, SpireError> {
        self.data.read().capability(operation).map(String::from)
    }

    pub(crate) fn collection(&self, name: &str) -> Result<Collection, SpireError> {
        self.data.read().collection(name)
    }

    pub(crate) fn replace_data(&self, data: ResourceData) {
        *self.data.write() = data;
    }
}

impl<T, D> Resource<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Media type of this resource kind.
    pub async fn media_type(&self) -> Result<String, SpireError> {
        self.client.media_type(self.kind).await
    }

    /// Refresh resource state.
    pub async fn get(&self) -> Result<ResourceData, SpireError> {
        let request = request::fetch(
            &self.url(),
            Some(self.capability("get")?.as_str()),
            &self.media_type().await?,
            &[],
        );
        let data: ResourceData = self.client.execute(request, 200).await?;

        debug!("Fetched {} {}", self.kind, data.url);
        self.replace_data(data.clone());
        Ok(data)
    }

    /// Replace resource properties.
    pub async fn update(&self, properties: Map<String, Value>) -> Result<ResourceData, SpireError> {
        let request = request::replace(
            &self.url(),
            Some(self.capability("update")?.as_str()),
            &self.media_type().await?,
            properties,
        )?;
        let data: ResourceData = self.client.execute(request, 200).await?;

        self.replace_data(data.clone());
        Ok(data)
    }

    /// Remove resource.
    pub async fn delete(&self) -> Result<(), SpireError> {
        let request = request::remove(
            &self.url(),
            Some(self.capability("delete")?.as_str()),
            &self.media_type().await?,
        );

        self.client.execute_empty(request, 204).await
    }
}

impl<T, D> SpireClientInstance<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Fetch resources of `collection` keyed by name.
    ///
    /// `capability` is the collection operation used for the request (`all`,
    /// `get_by_name`, ...), `kind` is the schema name used for `Accept`.
    pub(crate) async fn list_collection(
        &self,
        collection: &Collection,
        capability: &str,
        kind: &str,
        query: &[(&str, &str)],
    ) -> Result<HashMap<String, ResourceData>, SpireError> {
        let media_type = self.media_type(kind).await?;
        let request = request::fetch(
            &collection.url,
            Some(collection.capability(capability)?),
            &media_type,
            query,
        );

        let resources: HashMap<String, ResourceData> = self.execute(request, 200).await?;
        debug!("Fetched {} {kind} from {}", resources.len(), collection.url);
        Ok(resources)
    }

    /// Create a `kind` resource in `collection`.
    ///
    /// # Errors
    /// [`SpireError::Conflict`] when a resource with the same name exists.
    pub(crate) async fn create_in_collection<B>(
        &self,
        collection: &Collection,
        kind: &str,
        body: B,
    ) -> Result<ResourceData, SpireError>
    where
        B: Serialize,
    {
        let media_type = self.media_type(kind).await?;
        let request = request::create(
            &collection.url,
            Some(collection.capability("create")?),
            Some((&media_type, &media_type)),
            body,
        )?;

        self.execute(request, request::CREATED_STATUS).await
    }
}
