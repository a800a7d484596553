//! # Subscribe module
//!
//! Subscriptions, their events and the listening loop which delivers events
//! to listeners.

#[doc(inline)]
pub use event::{Event, EventType, Join, Message, Part};
pub mod event;

#[doc(inline)]
pub use cursor::SubscriptionCursor;
pub mod cursor;

#[doc(inline)]
pub use types::{EventsBatch, EventsOptions, OrderBy};
pub mod types;

#[doc(inline)]
pub use listeners::{ListenerCallback, ListenerKey};
pub mod listeners;

#[doc(inline)]
pub use subscription::Subscription;
pub mod subscription;

pub(crate) mod dispatch;
