//! # Listener invocations
//!
//! Every (listener, event) pair is delivered by its own task. Tasks are
//! tracked by listener event type and name so they can be cancelled when the
//! listener is removed or listening stops.

use futures::{
    future::{AbortHandle, Abortable, Aborted},
    FutureExt,
};
use log::{debug, error};
use spin::Mutex;
use std::{
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    core::RuntimeSupport,
    dx::subscribe::{listeners::ListenerCallback, Event, EventType},
};

/// Listener names are unique only within one event type.
type ListenerId = (EventType, String);

/// In-flight listener invocations keyed by listener event type and name.
#[derive(Debug, Default)]
pub(crate) struct InFlightInvocations {
    next_id: AtomicU64,
    handles: Mutex<HashMap<ListenerId, HashMap<u64, AbortHandle>>>,
}

impl InFlightInvocations {
    /// Spawn invocation of `callback` with `event`.
    ///
    /// A panic inside the listener is logged and doesn't affect other
    /// invocations or the listening loop.
    pub fn spawn(
        self: &Arc<Self>,
        runtime: &RuntimeSupport,
        name: String,
        callback: ListenerCallback,
        event: Event,
    ) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = (event.event_type(), name);
        let (handle, registration) = AbortHandle::new_pair();
        self.handles
            .lock()
            .entry(listener.clone())
            .or_default()
            .insert(id, handle);

        let invocation = Abortable::new(
            AssertUnwindSafe(async move { callback(event).await }).catch_unwind(),
            registration,
        );
        let invocations = Arc::clone(self);

        runtime.spawn(async move {
            let (event_type, name) = &listener;
            match invocation.await {
                Ok(Ok(())) => {}
                Ok(Err(panic)) => error!(
                    "{event_type} listener '{name}' failed: {}",
                    panic
                        .downcast_ref::<&str>()
                        .map(ToString::to_string)
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into())
                ),
                Err(Aborted) => {
                    debug!("{event_type} listener '{name}' invocation {id} cancelled")
                }
            }

            invocations.complete(&listener, id);
        });
    }

    fn complete(&self, listener: &ListenerId, id: u64) {
        let mut handles = self.handles.lock();
        if let Some(invocations) = handles.get_mut(listener) {
            invocations.remove(&id);
            if invocations.is_empty() {
                handles.remove(listener);
            }
        }
    }

    /// Cancel in-flight invocations of `event_type` listener `name`.
    pub fn cancel(&self, event_type: EventType, name: &str) -> usize {
        let invocations = self
            .handles
            .lock()
            .remove(&(event_type, name.to_string()))
            .unwrap_or_default();
        invocations.values().for_each(AbortHandle::abort);

        invocations.len()
    }

    /// Cancel all in-flight invocations.
    pub fn cancel_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());

        handles
            .into_values()
            .map(|invocations| {
                invocations.values().for_each(AbortHandle::abort);
                invocations.len()
            })
            .sum()
    }

    /// Number of invocations which haven't completed yet.
    pub fn len(&self) -> usize {
        self.handles.lock().values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::{
        dx::subscribe::{Join, Message},
        providers::futures_tokio::RuntimeTokio,
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn event() -> Event {
        Event::Message(Message {
            timestamp: 1,
            content: "hello".into(),
            properties: Default::default(),
        })
    }

    fn join() -> Event {
        Event::Join(Join {
            timestamp: 2,
            properties: Default::default(),
        })
    }

    fn slow(finished: Arc<AtomicUsize>) -> ListenerCallback {
        Arc::new(move |_: Event| {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn run_invocation_and_forget_it() {
        let invocations = Arc::new(InFlightInvocations::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let callback: ListenerCallback = Arc::new(move |_: Event| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        });

        invocations.spawn(&RuntimeSupport::new(RuntimeTokio), "a".into(), callback, event());
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(invocations.len(), 0);
    }

    #[tokio::test]
    async fn survive_panicking_listener() {
        let invocations = Arc::new(InFlightInvocations::default());
        let callback: ListenerCallback = Arc::new(|_: Event| async { panic!("listener failure") }.boxed());

        invocations.spawn(&RuntimeSupport::new(RuntimeTokio), "a".into(), callback, event());
        settle().await;

        assert_eq!(invocations.len(), 0);
    }

    #[tokio::test]
    async fn cancel_invocations_of_listener() {
        let invocations = Arc::new(InFlightInvocations::default());
        let runtime = RuntimeSupport::new(RuntimeTokio);
        let finished = Arc::new(AtomicUsize::new(0));

        invocations.spawn(&runtime, "a".into(), slow(finished.clone()), event());
        invocations.spawn(&runtime, "a".into(), slow(finished.clone()), event());
        invocations.spawn(&runtime, "b".into(), slow(finished.clone()), event());

        assert_eq!(invocations.cancel(EventType::Message, "a"), 2);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(invocations.len(), 0);
    }

    #[tokio::test]
    async fn cancel_only_listener_of_same_event_type() {
        let invocations = Arc::new(InFlightInvocations::default());
        let runtime = RuntimeSupport::new(RuntimeTokio);
        let messages = Arc::new(AtomicUsize::new(0));
        let joins = Arc::new(AtomicUsize::new(0));

        invocations.spawn(&runtime, "audit".into(), slow(messages.clone()), event());
        invocations.spawn(&runtime, "audit".into(), slow(joins.clone()), join());

        assert_eq!(invocations.cancel(EventType::Message, "audit"), 1);
        assert_eq!(invocations.len(), 1);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(messages.load(Ordering::SeqCst), 0);
        assert_eq!(joins.load(Ordering::SeqCst), 1);
        assert_eq!(invocations.len(), 0);
    }

    #[tokio::test]
    async fn cancel_all_invocations() {
        let invocations = Arc::new(InFlightInvocations::default());
        let runtime = RuntimeSupport::new(RuntimeTokio);
        let callback: ListenerCallback = Arc::new(|_: Event| {
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            .boxed()
        });

        invocations.spawn(&runtime, "a".into(), callback.clone(), event());
        invocations.spawn(&runtime, "b".into(), callback, event());

        assert_eq!(invocations.cancel_all(), 2);
        assert_eq!(invocations.len(), 0);
    }
}
