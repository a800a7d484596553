//! # Futures implementation using Tokio runtime
//!
//! This module contains [`RuntimeTokio`] type.
//!
//! It requires the [`tokio` feature] to be enabled.
//!
//! [`tokio` feature]: ../../index.html#features

use crate::core::Runtime;
use std::future::Future;

/// Tokio-based `async` tasks spawner.
#[derive(Copy, Clone, Debug, Default)]
pub struct RuntimeTokio;

impl Runtime for RuntimeTokio {
    fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
    where
        R: Send + 'static,
    {
        tokio::spawn(future);
    }
}
