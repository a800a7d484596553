//! # Application member
//!
//! Member is an end user of an [`Application`] which authenticates with login
//! and password.
//!
//! [`Application`]: ../application/struct.Application.html

use std::ops::Deref;

use crate::dx::{
    resource::{Resource, ResourceData},
    SpireClientInstance,
};

/// Application member handle.
#[derive(Debug)]
pub struct Member<T, D> {
    resource: Resource<T, D>,
}

impl<T, D> Member<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            resource: Resource::new(client, "member", data),
        }
    }

    /// Member login.
    pub fn login(&self) -> Option<String> {
        self.data().string("login")
    }
}

impl<T, D> Clone for Member<T, D> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T, D> Deref for Member<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
