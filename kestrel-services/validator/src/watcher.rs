// std
use std::sync::Arc;
use std::time::Duration;
// crates
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, span, Instrument as _, Level};
// internal
use crate::audit::Auditor;
use crate::engine::AuditTask;
use crate::{AUDIT_TAG, CHAIN_WATCHER_TAG};
use kestrel_core::chain::{ChainContext, ChainError};
use kestrel_core::proofs::Prover;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_CONFIRMATION_DELAY: u64 = 1;

const fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

const fn default_confirmation_delay() -> u64 {
    DEFAULT_CONFIRMATION_DELAY
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatcherSettings {
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Blocks that must follow a block before its commitments are audited.
    #[serde(default = "default_confirmation_delay")]
    pub confirmation_delay: u64,
    /// First block to scan, the chain head at startup when unset.
    #[serde(default)]
    pub start_height: Option<u64>,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_delay: DEFAULT_CONFIRMATION_DELAY,
            start_height: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatcherPhase {
    Idle,
    Scanning,
    WaitingNextTick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatcherStatus {
    pub phase: WatcherPhase,
    /// Next block to be scanned.
    pub last_scanned_height: Option<u64>,
}

/// Read-only view of a running [`ChainWatcher`].
#[derive(Clone, Debug)]
pub struct WatcherHandle {
    status: watch::Receiver<WatcherStatus>,
}

impl WatcherHandle {
    #[must_use]
    pub fn status(&self) -> WatcherStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn last_scanned_height(&self) -> Option<u64> {
        self.status().last_scanned_height
    }
}

/// Polls the chain head and hands publish commitments of confirmed blocks to
/// the [`Auditor`], one block per tick. Only this loop advances the height.
pub struct ChainWatcher<P> {
    chain: ChainContext,
    auditor: Arc<Auditor<P>>,
    settings: WatcherSettings,
    last_scanned_height: Option<u64>,
    status: watch::Sender<WatcherStatus>,
}

impl<P> ChainWatcher<P>
where
    P: Prover + 'static,
{
    pub fn new(
        chain: ChainContext,
        auditor: Arc<Auditor<P>>,
        settings: WatcherSettings,
    ) -> (Self, WatcherHandle) {
        let last_scanned_height = settings.start_height;
        let (status, receiver) = watch::channel(WatcherStatus {
            phase: WatcherPhase::Idle,
            last_scanned_height,
        });
        (
            Self {
                chain,
                auditor,
                settings,
                last_scanned_height,
                status,
            },
            WatcherHandle { status: receiver },
        )
    }

    /// Ticks until `shutdown` is cancelled. A scan in progress always finishes.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        async {
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        info!("Chain watcher stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(err) = self.tick().await {
                            error!("Error scanning chain due to {err:?}");
                        }
                        self.set_phase(WatcherPhase::WaitingNextTick);
                    }
                }
            }
        }
        .instrument(span!(Level::TRACE, CHAIN_WATCHER_TAG))
        .await;
        self.set_phase(WatcherPhase::Idle);
    }

    /// Scans at most one block and returns how many audits were started.
    pub async fn tick(&mut self) -> Result<usize, ChainError> {
        self.set_phase(WatcherPhase::Scanning);
        let head = self.chain.rpc().latest_height().await?;
        let next = match self.last_scanned_height {
            Some(height) => height,
            None => {
                self.advance(head);
                head
            }
        };
        if head <= next.saturating_add(self.settings.confirmation_delay) {
            debug!("Waiting for block {next} to be confirmed, head at {head}");
            return Ok(0);
        }

        let messages = self.chain.rpc().block_messages(next).await?;
        let mut started = 0;
        for task in messages.into_iter().filter_map(AuditTask::from_message) {
            self.spawn_audit(task);
            started += 1;
        }
        if started > 0 {
            info!("Auditing {started} commitments from block {next}");
        }
        self.advance(next + 1);
        Ok(started)
    }

    fn spawn_audit(&self, task: AuditTask) {
        let auditor = Arc::clone(&self.auditor);
        tokio::spawn(
            async move {
                let uri = task.metadata_uri.clone();
                match auditor.audit(task).await {
                    Ok(outcome) => info!("Audit of {uri} finished: {outcome:?}"),
                    Err(err) => error!("Error auditing {uri} due to {err:?}"),
                }
            }
            .instrument(span!(Level::TRACE, AUDIT_TAG)),
        );
    }

    fn advance(&mut self, height: u64) {
        self.last_scanned_height = Some(height);
        self.status
            .send_modify(|status| status.last_scanned_height = Some(height));
    }

    fn set_phase(&self, phase: WatcherPhase) {
        self.status.send_modify(|status| status.phase = phase);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{fixture, full_policy, Fixture};
    use kestrel_core::chain::DaMessage;
    use kestrel_core::proofs::mock::MockProver;

    fn watcher(
        fixture: &Fixture,
        prover: MockProver,
        settings: WatcherSettings,
    ) -> (ChainWatcher<MockProver>, WatcherHandle) {
        ChainWatcher::new(
            fixture.validator_context(),
            Arc::new(fixture.auditor(full_policy(), prover)),
            settings,
        )
    }

    async fn wait_for_proofs(fixture: &Fixture, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let proofs = fixture
                    .chain
                    .broadcasts()
                    .iter()
                    .filter(|message| matches!(message, DaMessage::SubmitValidityProof { .. }))
                    .count();
                if proofs >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn scans_only_confirmed_blocks() {
        let fixture = fixture(2);
        fixture.publish(&[1u8; 24]).await;
        let (mut watcher, handle) = watcher(
            &fixture,
            MockProver::default(),
            WatcherSettings {
                confirmation_delay: 2,
                start_height: Some(0),
                ..WatcherSettings::default()
            },
        );

        assert_eq!(watcher.tick().await.unwrap(), 0);
        fixture.chain.set_height(2);
        assert_eq!(watcher.tick().await.unwrap(), 0);
        assert_eq!(handle.last_scanned_height(), Some(0));

        fixture.chain.set_height(3);
        assert_eq!(watcher.tick().await.unwrap(), 1);
        assert_eq!(handle.last_scanned_height(), Some(1));
        assert_eq!(handle.status().phase, WatcherPhase::Scanning);
        wait_for_proofs(&fixture, 1).await;
    }

    #[tokio::test]
    async fn starts_from_chain_head() {
        let fixture = fixture(2);
        fixture.chain.set_height(10);
        let (mut watcher, handle) = watcher(
            &fixture,
            MockProver::default(),
            WatcherSettings::default(),
        );
        assert_eq!(handle.last_scanned_height(), None);
        assert_eq!(watcher.tick().await.unwrap(), 0);
        assert_eq!(handle.last_scanned_height(), Some(10));
    }

    #[tokio::test]
    async fn failing_audits_do_not_stop_scanning() {
        let fixture = fixture(2);
        fixture.publish(&[1u8; 24]).await;
        fixture.chain.set_height(1);
        fixture.publish(&[2u8; 24]).await;
        fixture.chain.set_height(5);
        let (watcher, handle) = watcher(
            &fixture,
            MockProver::without_key(),
            WatcherSettings {
                poll_interval: Duration::from_millis(10),
                confirmation_delay: 1,
                start_height: Some(0),
            },
        );
        let shutdown = CancellationToken::new();
        let running = tokio::spawn(watcher.run(shutdown.clone()));

        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.last_scanned_height() < Some(4) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        shutdown.cancel();
        running.await.unwrap();

        assert_eq!(handle.status().phase, WatcherPhase::Idle);
        assert_eq!(handle.last_scanned_height(), Some(4));
        assert!(fixture.messages_after_publish().is_empty());
    }
}
