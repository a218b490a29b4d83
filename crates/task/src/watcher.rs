//! Polling a bridge message towards a target status.

use crate::{
    bridge::{BridgeOracle, MessageStatus},
    checkpoint::{Checkpoint, CheckpointStore},
    TaskError,
};
use alloy_primitives::TxHash;
use metrics::gauge;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Follows one message through its lifecycle.
///
/// The watcher keeps the highest status it has observed. A poll reporting an
/// earlier status (lagging RPC node, reorg) is held at the last observed one,
/// so callers only ever see a non-decreasing sequence.
pub struct MessageWatcher<'a, O> {
    oracle: &'a O,
    tx_hash: TxHash,
    last: MessageStatus,
    poll_interval: Duration,
    timeout: Option<Duration>,
    checkpoint: Option<(&'a CheckpointStore, &'a str, &'a str)>,
}

impl<'a, O: BridgeOracle> MessageWatcher<'a, O> {
    pub const fn new(
        oracle: &'a O,
        tx_hash: TxHash,
        known: MessageStatus,
        poll_interval: Duration,
    ) -> Self {
        Self {
            oracle,
            tx_hash,
            last: known,
            poll_interval,
            timeout: None,
            checkpoint: None,
        }
    }

    /// Bound every [`Self::wait_for`] call.
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record every status advance in `store` under (task, network).
    pub const fn with_checkpoint(
        mut self,
        store: Option<&'a CheckpointStore>,
        task: &'a str,
        network: &'a str,
    ) -> Self {
        self.checkpoint = match store {
            Some(store) => Some((store, task, network)),
            None => None,
        };
        self
    }

    /// Poll the oracle once and return the observed status.
    pub async fn poll_once(&mut self) -> Result<MessageStatus, TaskError> {
        let reported = self.oracle.status(self.tx_hash).await?;

        if reported < self.last {
            warn!(
                tx_hash = %self.tx_hash,
                %reported,
                last = %self.last,
                "Bridge reported an earlier status, keeping the last observed one"
            );
            return Ok(self.last);
        }

        if reported > self.last {
            info!(tx_hash = %self.tx_hash, from = %self.last, to = %reported, "Message status advanced");
            self.last = reported;
            gauge!("zklink_ops_bridge_status").set(f64::from(reported.ordinal()));

            if let Some((store, task, network)) = self.checkpoint {
                store.save(&Checkpoint::new(task, network, self.tx_hash, reported))?;
            }
        }

        Ok(self.last)
    }

    /// Poll until the message reached `target` or any later status.
    pub async fn wait_for(&mut self, target: MessageStatus) -> Result<MessageStatus, TaskError> {
        let started = Instant::now();
        info!(tx_hash = %self.tx_hash, %target, "Waiting for message status");

        loop {
            let status = self.poll_once().await?;
            if status >= target {
                return Ok(status);
            }

            let waited = started.elapsed();
            if let Some(timeout) = self.timeout {
                if waited >= timeout {
                    return Err(TaskError::BridgeStatusTimeout {
                        hash: self.tx_hash,
                        target,
                        last: status,
                        waited,
                    });
                }
            }

            debug!(tx_hash = %self.tx_hash, %status, %target, "Message not there yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedOracle;
    use MessageStatus::*;

    #[tokio::test]
    async fn test_observed_status_never_regresses() {
        let oracle = ScriptedOracle::new([
            Sent,
            ReadyToProve,
            Sent,
            Proven,
            ReadyToProve,
            ReadyForRelay,
            Sent,
            Relayed,
            Proven,
        ]);
        let mut watcher =
            MessageWatcher::new(&oracle, TxHash::repeat_byte(1), Sent, Duration::ZERO);

        let mut observed = Vec::new();
        for _ in 0..9 {
            observed.push(watcher.poll_once().await.unwrap());
        }

        assert!(observed.windows(2).all(|w| w[0] <= w[1]), "{observed:?}");
        assert_eq!(
            observed,
            [Sent, ReadyToProve, ReadyToProve, Proven, Proven, ReadyForRelay, ReadyForRelay, Relayed, Relayed]
        );
    }

    #[tokio::test]
    async fn test_known_status_is_a_floor() {
        let oracle = ScriptedOracle::new([Sent, ReadyToProve]);
        let mut watcher =
            MessageWatcher::new(&oracle, TxHash::repeat_byte(1), Proven, Duration::ZERO);

        assert_eq!(watcher.poll_once().await.unwrap(), Proven);
        assert_eq!(watcher.poll_once().await.unwrap(), Proven);
    }

    #[tokio::test]
    async fn test_wait_for_returns_first_status_at_or_past_target() {
        let oracle = ScriptedOracle::new([Sent, Sent, Proven, Relayed]);
        let mut watcher =
            MessageWatcher::new(&oracle, TxHash::repeat_byte(1), Sent, Duration::from_millis(1));

        assert_eq!(watcher.wait_for(ReadyToProve).await.unwrap(), Proven);
        assert_eq!(oracle.polls(), 3);
    }

    #[tokio::test]
    async fn test_bounded_wait_times_out() {
        let oracle = ScriptedOracle::new([Sent, ReadyToProve]);
        let hash = TxHash::repeat_byte(7);
        let mut watcher = MessageWatcher::new(&oracle, hash, Sent, Duration::from_millis(5))
            .with_timeout(Some(Duration::from_millis(30)));

        let err = watcher.wait_for(Relayed).await.unwrap_err();
        match err {
            TaskError::BridgeStatusTimeout {
                hash: h,
                target,
                last,
                waited,
            } => {
                assert_eq!(h, hash);
                assert_eq!(target, Relayed);
                assert_eq!(last, ReadyToProve);
                assert!(waited >= Duration::from_millis(30));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_advances_are_checkpointed() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let hash = TxHash::repeat_byte(2);
        let oracle = ScriptedOracle::new([ReadyToProve, Sent]);

        let mut watcher = MessageWatcher::new(&oracle, hash, Sent, Duration::ZERO)
            .with_checkpoint(Some(&store), "sync-l2-requests", "OPTIMISM");
        watcher.poll_once().await.unwrap();
        watcher.poll_once().await.unwrap();

        let saved = store.load("sync-l2-requests", "OPTIMISM").unwrap().unwrap();
        assert_eq!(saved.tx_hash, hash);
        assert_eq!(saved.status, ReadyToProve);
    }
}
