//! # spire.io Rust client
//!
//! Client for the [spire.io] pub/sub HTTP API.
//!
//! The client discovers the API description, opens sessions and works with
//! the resources reachable from a session: channels, subscriptions,
//! applications and their members, notifications. Every resource request is
//! signed with the capability handed out by the service.
//!
//! Subscriptions are read with long-poll requests. A [`Subscription`] keeps
//! the cursor of the last received event so events are never delivered twice,
//! and can run a listening loop which delivers every received event to the
//! registered listeners.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! spire-io = "0.1.0"
//! ```
//!
//! ### Example
//!
//! ```no_run
//! use spire_io::{core::SpireError, SpireClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SpireError> {
//!     let spire = SpireClientBuilder::with_reqwest_transport()
//!         .with_default_url()
//!         .build()?;
//!
//!     let session = spire.login("user@example.com", "password").await?;
//!     let channel = session.find_or_create_channel("news").await?;
//!     let subscription = session
//!         .find_or_create_subscription("reader", &["news"])
//!         .await?;
//!
//!     channel.publish("Message 1").await?;
//!     let batch = subscription.poll().await?;
//!     println!("{:?}", batch.contents());
//!
//!     subscription.add_listener("message", None, |event| async move {
//!         println!("received {:?}", event.content());
//!     })?;
//!     subscription.start_listening()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! * `default` - default features that include:
//!   * `reqwest` - [`reqwest`] transport
//!   * `tokio` - [`tokio`] runtime for the listening loop
//! * `full` - all non-conflicting features
//!
//! [spire.io]: https://www.spire.io/
//! [`reqwest`]: https://docs.rs/reqwest
//! [`tokio`]: https://docs.rs/tokio

#[doc(inline)]
pub use dx::{
    Account, Application, Channel, ChannelOptions, Member, Notification, Session,
    SpireClientBuilder, SpireClientInstance, SpireClientRuntimeBuilder, SpireGenericClient,
};

#[doc(inline)]
pub use dx::subscribe::{
    Event, EventType, EventsBatch, EventsOptions, ListenerKey, Message, OrderBy, Subscription,
    SubscriptionCursor,
};

#[cfg(feature = "reqwest")]
#[doc(inline)]
pub use dx::SpireClient;

pub mod core;
pub mod dx;
pub mod providers;
pub mod transport;
