//! # Async runtime module
//!
//! This module contains the [`Runtime`] trait used to spawn the subscription
//! listening loop and listener invocations.

use futures::future::BoxFuture;
use std::{fmt::Debug, future::Future, sync::Arc};

/// spire.io runtime trait.
///
/// This trait is used to spawn async tasks in work of the spire.io client.
/// Listening on a subscription runs one long-poll loop and a separate task
/// for every listener invocation, all of them spawned through this trait.
///
/// # Examples
/// ```
/// use spire_io::core::Runtime;
/// use std::future::Future;
///
/// #[derive(Clone)]
/// struct MyRuntime;
///
/// impl Runtime for MyRuntime {
///    fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
///    where
///        R: Send + 'static,
///    {
///       // spawn the Future
///       // e.g. tokio::spawn(future);
///    }
/// }
/// ```
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Spawn a task.
    ///
    /// This method is used to spawn a task.
    fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
    where
        R: Send + 'static;
}

/// Type-erased [`Runtime`] shared between client and subscriptions.
#[derive(Clone)]
pub(crate) struct RuntimeSupport {
    spawner: Arc<dyn Fn(BoxFuture<'static, ()>) + Send + Sync>,
}

impl RuntimeSupport {
    pub fn new<R>(runtime: R) -> Self
    where
        R: Runtime,
    {
        Self {
            spawner: Arc::new(move |future: BoxFuture<'static, ()>| runtime.spawn(future)),
        }
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        (self.spawner)(Box::pin(future))
    }
}

impl Debug for RuntimeSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RuntimeSupport")
    }
}
