//! Chain observer: follows one chain in one direction and emits confirmed
//! `Transfer`s (spec §4.2, component C2).
//!
//! Algorithm per tick:
//! 1. Read the chain's current head height `H`.
//! 2. Compute `confirmed_head = H - finality_depth`.
//! 3. Scan blocks `(last_scanned, confirmed_head]` in bounded batches.
//! 4. For each bridge-relevant event, materialize a `Transfer` with a
//!    derived id and emit exactly once.
//! 5. Persist `last_scanned = confirmed_head` atomically with emission.
//!
//! One `ChainObserver` watches one chain for one direction: an L1 observer
//! only ever produces `Direction::L1ToL2` transfers, an L2 observer only
//! ever produces `Direction::L2ToL1` transfers. A bridge between two chains
//! runs exactly two of these.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bridge_core::{ChainId, Direction, HealthEvent, HexBytes, Transfer};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::checkpoint::ScanCheckpoint;
use crate::rpc::{ChainRpc, ChainRpcError, RawBridgeEvent};

/// A `Transfer` as produced fresh off a chain observer, together with the
/// confirmation depth it had at the moment of observation (diagnostic only;
/// does not affect the transfer's own identity or validity).
#[derive(Debug, Clone)]
pub struct ObservedEvent {
    pub transfer: Transfer,
    pub confirmations_at_observation: u64,
}

#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    pub direction: Direction,
    pub finality_depth: u64,
    pub scan_interval: Duration,
    pub max_batch_blocks: u64,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// How far in the future a transfer's deadline is set from its
    /// observed-at timestamp. The observer, not the validator, owns this
    /// because it is the point at which `observed_at` is known.
    pub transfer_ttl: Duration,
    /// Window of recent (height, hash) pairs kept to detect a reorg that
    /// rewrites blocks at or below `last_scanned`.
    pub reorg_window: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        ObserverConfig {
            source_chain: ChainId(0),
            dest_chain: ChainId(0),
            direction: Direction::L1ToL2,
            finality_depth: 12,
            scan_interval: Duration::from_secs(6),
            max_batch_blocks: 500,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(60),
            transfer_ttl: Duration::from_secs(3600),
            reorg_window: 64,
        }
    }
}

pub struct ChainObserver {
    config: ObserverConfig,
    rpc: Arc<dyn ChainRpc>,
    checkpoint: Arc<dyn ScanCheckpoint>,
    out_tx: mpsc::Sender<ObservedEvent>,
    health_tx: mpsc::Sender<HealthEvent>,
    seen_heights: VecDeque<(u64, Vec<u8>)>,
    consecutive_failures: u32,
}

impl ChainObserver {
    pub fn new(
        config: ObserverConfig,
        rpc: Arc<dyn ChainRpc>,
        checkpoint: Arc<dyn ScanCheckpoint>,
        out_tx: mpsc::Sender<ObservedEvent>,
        health_tx: mpsc::Sender<HealthEvent>,
    ) -> Self {
        ChainObserver {
            config,
            rpc,
            checkpoint,
            out_tx,
            health_tx,
            seen_heights: VecDeque::new(),
            consecutive_failures: 0,
        }
    }

    /// Runs the tick loop until `shutdown` resolves. Intended to be spawned
    /// as its own tokio task.
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.config.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(backoff) = self.tick().await {
                        tracing::warn!(
                            chain_id = self.config.source_chain.0,
                            consecutive_failures = self.consecutive_failures,
                            "chain observer tick failed, backing off for {:?}", backoff
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(chain_id = self.config.source_chain.0, "chain observer shutting down");
                    return;
                }
            }
        }
    }

    /// Runs exactly one scan step. Returns `Err(backoff_duration)` when the
    /// tick failed and the caller should wait before retrying.
    async fn tick(&mut self) -> Result<(), Duration> {
        let head = match self.rpc.get_latest_block().await {
            Ok(head) => {
                self.consecutive_failures = 0;
                head
            }
            Err(err) => return Err(self.record_failure(err).await),
        };

        if head.height < self.config.finality_depth {
            return Ok(());
        }
        let confirmed_head = head.height - self.config.finality_depth;

        if let Err(err) = self.check_for_reorg(confirmed_head).await {
            return Err(self.record_failure(err).await);
        }

        let last_scanned = self.checkpoint.load_last_scanned();
        if confirmed_head <= last_scanned {
            return Ok(());
        }

        let mut from = last_scanned;
        while from < confirmed_head {
            let to = (from + self.config.max_batch_blocks).min(confirmed_head);
            match self.rpc.scan_events(from, to).await {
                Ok(events) => {
                    self.consecutive_failures = 0;
                    for raw in events {
                        self.emit(raw, head.height).await;
                    }
                    self.checkpoint.save_last_scanned(to);
                    self.remember_height(to, &head.hash);
                    from = to;
                }
                Err(err) => return Err(self.record_failure(err).await),
            }
        }

        Ok(())
    }

    /// Compares the chain's current hash at our last-remembered confirmed
    /// height against what we recorded. A mismatch means a reorg rewrote
    /// history we believed final; rewind `last_scanned` to the last height
    /// whose hash still agrees, so those blocks are rescanned and any
    /// transfers they contained are re-observed (the transfer id is
    /// deterministic, so a downstream dedup check makes this re-emission
    /// safe rather than double-counted).
    async fn check_for_reorg(&mut self, confirmed_head: u64) -> Result<(), ChainRpcError> {
        for (height, expected_hash) in self.seen_heights.iter().rev() {
            if *height > confirmed_head {
                continue;
            }
            let actual_hash = self.rpc.block_hash_at(*height).await?;
            if actual_hash != *expected_hash {
                tracing::warn!(
                    chain_id = self.config.source_chain.0,
                    height,
                    "reorg detected, rewinding"
                );
                let fork_point = self.seen_heights
                    .iter()
                    .filter(|(h, _)| *h < *height)
                    .map(|(h, _)| *h)
                    .max()
                    .unwrap_or(0);
                self.checkpoint.save_last_scanned(fork_point);
                self.seen_heights.retain(|(h, _)| *h <= fork_point);
                return Ok(());
            }
            break;
        }
        Ok(())
    }

    fn remember_height(&mut self, height: u64, hash: &[u8]) {
        self.seen_heights.push_back((height, hash.to_vec()));
        while self.seen_heights.len() > self.config.reorg_window {
            self.seen_heights.pop_front();
        }
    }

    async fn emit(&self, raw: RawBridgeEvent, head_height: u64) {
        let observed_at = now_unix_ms();
        let deadline = observed_at + self.config.transfer_ttl.as_millis() as i64;

        let transfer = match Transfer::new(
            self.config.direction,
            self.config.source_chain,
            self.config.dest_chain,
            raw.amount,
            HexBytes(raw.sender),
            HexBytes(raw.recipient),
            raw.block_height,
            HexBytes(raw.tx_hash),
            raw.log_index,
            raw.nonce,
            observed_at,
            deadline,
        ) {
            Ok(transfer) => transfer,
            Err(err) => {
                tracing::error!(chain_id = self.config.source_chain.0, error = %err, "dropping malformed chain event");
                return;
            }
        };

        let confirmations = head_height.saturating_sub(raw.block_height);
        let event = ObservedEvent { transfer, confirmations_at_observation: confirmations };
        if self.out_tx.send(event).await.is_err() {
            tracing::warn!(chain_id = self.config.source_chain.0, "observed-event channel closed, dropping event");
        }
    }

    async fn record_failure(&mut self, err: ChainRpcError) -> Duration {
        self.consecutive_failures += 1;
        tracing::warn!(chain_id = self.config.source_chain.0, error = %err, attempt = self.consecutive_failures, "chain RPC call failed");

        if self.consecutive_failures >= 3 {
            let _ = self.health_tx.send(HealthEvent::ChainRpcDegraded {
                chain_id: self.config.source_chain.0,
                consecutive_failures: self.consecutive_failures,
            }).await;
        }

        let exponent = self.consecutive_failures.saturating_sub(1).min(6);
        let scaled = self.config.backoff_base * 2u32.saturating_pow(exponent);
        scaled.min(self.config.backoff_cap)
    }
}

fn now_unix_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeRpc {
        heads: Mutex<VecDeque<ChainHeadStub>>,
    }

    #[derive(Clone)]
    struct ChainHeadStub {
        height: u64,
        hash: Vec<u8>,
        events: Vec<RawBridgeEvent>,
        hash_at: std::collections::HashMap<u64, Vec<u8>>,
    }

    use crate::rpc::ChainHead;

    #[async_trait::async_trait]
    impl ChainRpc for FakeRpc {
        async fn get_latest_block(&self) -> Result<ChainHead, ChainRpcError> {
            let heads = self.heads.lock().unwrap();
            let latest = heads.back().cloned().ok_or(ChainRpcError::Timeout)?;
            Ok(ChainHead { height: latest.height, hash: latest.hash })
        }

        async fn block_hash_at(&self, height: u64) -> Result<Vec<u8>, ChainRpcError> {
            let heads = self.heads.lock().unwrap();
            let latest = heads.back().ok_or(ChainRpcError::Timeout)?;
            latest.hash_at.get(&height).cloned().ok_or(ChainRpcError::Protocol("unknown height".into()))
        }

        async fn scan_events(&self, from: u64, to: u64) -> Result<Vec<RawBridgeEvent>, ChainRpcError> {
            let heads = self.heads.lock().unwrap();
            let latest = heads.back().ok_or(ChainRpcError::Timeout)?;
            Ok(latest.events.iter().filter(|e| e.block_height > from && e.block_height <= to).cloned().collect())
        }

        async fn submit_signed_transaction(&self, _payload: &[u8]) -> Result<crate::rpc::SubmissionReceipt, ChainRpcError> {
            unimplemented!("not exercised by observer tests")
        }
    }

    fn sample_event(height: u64, log_index: u32) -> RawBridgeEvent {
        RawBridgeEvent {
            tx_hash: vec![0xAB, height as u8],
            log_index,
            block_height: height,
            sender: vec![1, 2, 3],
            recipient: vec![4, 5, 6],
            amount: 1_000,
            nonce: height,
        }
    }

    #[tokio::test]
    async fn emits_confirmed_events_once() {
        let mut hash_at = std::collections::HashMap::new();
        for h in 0..=20 {
            hash_at.insert(h, vec![h as u8]);
        }
        let stub = ChainHeadStub {
            height: 20,
            hash: vec![20],
            events: vec![sample_event(5, 0), sample_event(15, 0)],
            hash_at,
        };
        let rpc = Arc::new(FakeRpc { heads: Mutex::new(VecDeque::from(vec![stub])) });
        let checkpoint = Arc::new(crate::checkpoint::InMemoryCheckpoint::starting_at(0));
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let (health_tx, _health_rx) = mpsc::channel(16);

        let mut observer = ChainObserver::new(
            ObserverConfig { finality_depth: 6, ..ObserverConfig::default() },
            rpc,
            checkpoint.clone(),
            out_tx,
            health_tx,
        );

        observer.tick().await.unwrap();

        let first = out_rx.recv().await.unwrap();
        assert_eq!(first.transfer.source_block_height, 5);
        let second = out_rx.recv().await.unwrap();
        assert_eq!(second.transfer.source_block_height, 15);
        assert_eq!(checkpoint.load_last_scanned(), 14);
    }

    #[tokio::test]
    async fn reports_degradation_after_three_failures() {
        let rpc = Arc::new(FakeRpc { heads: Mutex::new(VecDeque::new()) });
        let checkpoint = Arc::new(crate::checkpoint::InMemoryCheckpoint::starting_at(0));
        let (out_tx, _out_rx) = mpsc::channel(16);
        let (health_tx, mut health_rx) = mpsc::channel(16);

        let mut observer = ChainObserver::new(
            ObserverConfig::default(),
            rpc,
            checkpoint,
            out_tx,
            health_tx.clone(),
        );

        for _ in 0..3 {
            let _ = observer.tick().await;
        }

        let event = health_rx.recv().await.unwrap();
        assert!(matches!(event, HealthEvent::ChainRpcDegraded { consecutive_failures: 3, .. }));
    }
}
