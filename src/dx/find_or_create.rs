//! # Find-or-create
//!
//! Named resources (channels, subscriptions, applications, notifications) are
//! unique within their collection. Creating one which already exists is
//! answered with `409 Conflict`, which is resolved by looking the resource up
//! in a freshly fetched collection.

use log::warn;
use spin::Mutex;
use std::{collections::HashMap, future::Future};

use crate::core::SpireError;

/// How many conflicts are resolved for a single name before giving up.
pub const RETRY_CREATION_LIMIT: usize = 3;

/// Conflict counters of a single resource kind, keyed by resource name.
#[derive(Debug, Default)]
pub(crate) struct CreationAttempts {
    conflicts: Mutex<HashMap<String, usize>>,
}

impl CreationAttempts {
    fn record_conflict(&self, name: &str) -> usize {
        let mut conflicts = self.conflicts.lock();
        let count = conflicts.entry(name.to_string()).or_default();
        *count += 1;
        *count
    }

    fn reset(&self, name: &str) {
        self.conflicts.lock().remove(name);
    }

    #[cfg(test)]
    pub(crate) fn conflicts(&self, name: &str) -> usize {
        self.conflicts.lock().get(name).copied().unwrap_or_default()
    }
}

/// Create resource `name` or find the existing one.
///
/// `create` is called first. When it fails with [`SpireError::Conflict`] the
/// whole collection is fetched again with `refetch` and searched for `name`.
/// If it isn't there yet the sequence is repeated, at most
/// [`RETRY_CREATION_LIMIT`] times, after which the conflict is returned as
/// [`SpireError::Remote`].
pub(crate) async fn find_or_create<R, C, CF, F, FF>(
    kind: &str,
    name: &str,
    attempts: &CreationAttempts,
    create: C,
    refetch: F,
) -> Result<R, SpireError>
where
    C: Fn() -> CF,
    CF: Future<Output = Result<R, SpireError>>,
    F: Fn() -> FF,
    FF: Future<Output = Result<Option<R>, SpireError>>,
{
    loop {
        let error = match create().await {
            Ok(resource) => {
                attempts.reset(name);
                return Ok(resource);
            }
            Err(error) if error.is_conflict() => error,
            Err(error) => return Err(error),
        };

        let conflicts = attempts.record_conflict(name);
        warn!("{kind} '{name}' already exists (conflict {conflicts}), looking it up");

        if let Some(resource) = refetch().await? {
            attempts.reset(name);
            return Ok(resource);
        }

        if conflicts >= RETRY_CREATION_LIMIT {
            attempts.reset(name);
            return Err(error.into_remote());
        }
    }
}
