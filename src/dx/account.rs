//! # Account
//!
//! Account of the spire.io service. It is returned by
//! [`Session::account`].
//!
//! [`Session::account`]: ../session/struct.Session.html#method.account

use std::ops::Deref;

use crate::dx::{
    resource::{Resource, ResourceData},
    SpireClientInstance,
};

/// Account handle.
///
/// Account state is available through [`Resource`] methods, e.g.
/// `account.property("email")`.
#[derive(Debug)]
pub struct Account<T, D> {
    resource: Resource<T, D>,
}

impl<T, D> Account<T, D> {
    pub(crate) fn new(client: SpireClientInstance<T, D>, data: ResourceData) -> Self {
        Self {
            resource: Resource::new(client, "account", data),
        }
    }

    /// Account email address.
    pub fn email(&self) -> Option<String> {
        self.data().string("email")
    }
}

impl<T, D> Clone for Account<T, D> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T, D> Deref for Account<T, D> {
    type Target = Resource<T, D>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
