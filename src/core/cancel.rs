//! Listening loop cancellation module.
//!
//! This module provides [`CancellationTask`] which is used to abandon an
//! in-flight long-poll request when listening stops.
use async_channel::Receiver;

use crate::core::SpireError;

#[derive(Debug)]
pub(crate) struct CancellationTask {
    cancel_rx: Receiver<u64>,
    id: u64,
}

impl CancellationTask {
    pub fn new(cancel_rx: Receiver<u64>, id: u64) -> Self {
        Self { cancel_rx, id }
    }

    pub async fn wait_for_cancel(&self) -> Result<(), SpireError> {
        loop {
            if self
                .cancel_rx
                .recv()
                .await
                .map_err(|err| SpireError::Transport {
                    details: format!("Cancellation pipe failed: {err}"),
                })?
                .eq(&self.id)
            {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[tokio::test]
    async fn wait_for_cancel() {
        let (cancel_tx, cancel_rx) = async_channel::bounded(2);

        let cancel_task = CancellationTask::new(cancel_rx, 7);

        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            cancel_tx.send(3).await.unwrap();
            cancel_tx.send(7).await.unwrap();
        });

        cancel_task.wait_for_cancel().await.unwrap();
    }

    #[tokio::test]
    async fn fail_when_sender_dropped() {
        let (cancel_tx, cancel_rx) = async_channel::bounded::<u64>(1);
        let cancel_task = CancellationTask::new(cancel_rx, 1);
        drop(cancel_tx);

        assert!(cancel_task.wait_for_cancel().await.is_err());
    }
}
