//! # Notification
//!
//! Push notification target with registered devices.

use serde_json::{Map, Value};
use spin::RwLock;
use std::{collections::HashMap, ops::Deref, sync::Arc};

use crate::{
    core::{utils::headers::APPLICATION_JSON, Deserializer, SpireError, Transport},
    dx::{
        request,
        resource::{Resource, ResourceData},
        SpireClientInstance,
    },
};

/// Notification handle.
#[derive(Debug)]
pub struct Notification<T, D> {
    resource: Resource<T, D>,
    devices: Arc<RwLock<HashMap<String, Map<String, Value>>>>,
}

impl<T, D> Notification<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            resource: Resource::new(client, "notification", data),
            devices: Default::default(),
        }
    }

    /// Notification delivery mode (e.g. `development` or `production`).
    pub fn mode(&self) -> Option<String> {
        self.data().string("mode")
    }

    /// Devices added through this handle keyed by device token.
    pub fn devices(&self) -> HashMap<String, Map<String, Value>> {
        self.devices.read().clone()
    }
}

impl<T, D> Clone for Notification<T, D> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            devices: Arc::clone(&self.devices),
        }
    }
}

impl<T, D> Deref for Notification<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T, D> Notification<T, D>
where
    T: Transport + 'static,
    D: Deserializer + 'static,
{
    /// Register device `token` for notifications.
    ///
    /// `properties` are sent along with the token.
    pub async fn add_device(
        &self,
        token: &str,
        mut properties: Map<String, Value>,
    ) -> Result<Map<String, Value>, SpireError> {
        let devices = self.data().resource("devices")?;
        properties.insert("token".into(), token.into());

        let request = request::replace(
            &devices.url,
            Some(devices.capability("add_device")?),
            APPLICATION_JSON,
            properties,
        )?;
        let device: Map<String, Value> = self.client.execute(request, 200).await?;
        let token = device
            .get("token")
            .and_then(Value::as_str)
            .unwrap_or(token)
            .to_string();

        self.devices.write().insert(token, device.clone());
        Ok(device)
    }
}
