//! # spire.io Developer Experience
//!
//! This module provides the structures and methods for the [spire.io] pub/sub
//! service: discovery, sessions, resources and subscriptions.
//! It is intended to be used by the [`spire_io`] crate.
//!
//! [`spire_io`]: ../index.html
//! [spire.io]: https://www.spire.io/

#[doc(inline)]
pub use spire_client::{
    AccountInfo, SpireClientBuilder, SpireClientConfigBuilder, SpireClientDeserializerBuilder,
    SpireClientInstance, SpireClientRuntimeBuilder, SpireClientUrlBuilder, SpireConfig,
    SpireGenericClient, TransportConfiguration,
};

#[cfg(feature = "reqwest")]
#[doc(inline)]
pub use spire_client::SpireClient;
pub mod spire_client;

#[doc(inline)]
pub use description::ApiDescription;
pub mod description;

#[doc(inline)]
pub use resource::{Collection, Resource, ResourceData};
pub mod resource;

#[doc(inline)]
pub use find_or_create::RETRY_CREATION_LIMIT;
pub(crate) mod find_or_create;

pub(crate) mod request;

#[doc(inline)]
pub use session::Session;
pub mod session;

#[doc(inline)]
pub use account::Account;
pub mod account;

#[doc(inline)]
pub use channel::Channel;
pub mod channel;

#[doc(inline)]
pub use application::{Application, ChannelOptions};
pub mod application;

#[doc(inline)]
pub use member::Member;
pub mod member;

#[doc(inline)]
pub use notification::Notification;
pub mod notification;

pub mod subscribe;

#[cfg(test)]
pub(crate) mod mock;
