//! Execution task (spec §4.5, component C5): re-verify, submit, and track
//! confirmation for authorized bundles, one at a time in liveness order.

use std::sync::Arc;
use std::time::Duration;

use bridge_aggregator::AuthorizedBundle;
use bridge_chain::{ChainRpc, SubmissionReceipt};
use bridge_core::{HealthEvent, TransferId};
use bridge_store::CoordinationStore;
use tokio::sync::mpsc;

use crate::priority::ExecutionQueue;
use crate::tx_builder::DestinationTxBuilder;
use crate::verify::verify_bundle;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub threshold: usize,
    pub peer_heartbeat_ttl_ms: i64,
    pub finality_depth_dest: u64,
    pub confirmation_timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Executed { transfer_id: TransferId },
    Failed { transfer_id: TransferId, attempts: u32 },
}

pub struct Executor {
    config: ExecutorConfig,
    dest_rpc: Arc<dyn ChainRpc>,
    tx_builder: Arc<dyn DestinationTxBuilder>,
    coordination: Arc<dyn CoordinationStore>,
    health_tx: mpsc::Sender<HealthEvent>,
}

impl Executor {
    pub fn new(
        config: ExecutorConfig,
        dest_rpc: Arc<dyn ChainRpc>,
        tx_builder: Arc<dyn DestinationTxBuilder>,
        coordination: Arc<dyn CoordinationStore>,
        health_tx: mpsc::Sender<HealthEvent>,
    ) -> Self {
        Executor { config, dest_rpc, tx_builder, coordination, health_tx }
    }

    /// Drains `incoming` into a liveness-ordered queue and processes one
    /// bundle at a time, oldest-deadline-first, re-drawing from `incoming`
    /// whenever the queue empties.
    pub async fn run(self: Arc<Self>, mut incoming: mpsc::Receiver<AuthorizedBundle>) {
        let mut queue = ExecutionQueue::new();
        loop {
            if queue.is_empty() {
                match incoming.recv().await {
                    Some(bundle) => queue.push(bundle),
                    None => return,
                }
            }
            while let Ok(bundle) = incoming.try_recv() {
                queue.push(bundle);
            }
            if let Some(bundle) = queue.pop() {
                self.process(bundle).await;
            }
        }
    }

    async fn process(&self, bundle: AuthorizedBundle) -> ExecutionOutcome {
        let transfer_id = bundle.transfer.id;
        let active_peers = self.coordination.list_peers().await;
        let now = now_unix_ms();
        let active_and_fresh: Vec<_> = active_peers
            .into_iter()
            .filter(|p| p.is_heartbeat_fresh(now, self.config.peer_heartbeat_ttl_ms))
            .collect();

        if let Err(err) = verify_bundle(&bundle, self.config.threshold, &active_and_fresh) {
            tracing::error!(transfer_id = %transfer_id, error = %err, "bundle failed re-verification, refusing to submit");
            return ExecutionOutcome::Failed { transfer_id, attempts: 0 };
        }

        let payload = self.tx_builder.build(&bundle);

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.submit_and_confirm(&payload).await {
                Ok(()) => {
                    tracing::info!(transfer_id = %transfer_id, attempts, "transfer executed");
                    return ExecutionOutcome::Executed { transfer_id };
                }
                Err(err) => {
                    tracing::warn!(transfer_id = %transfer_id, attempt = attempts, error = %err, "execution attempt failed");
                    if attempts >= self.config.max_retries {
                        let _ = self.health_tx.send(HealthEvent::ExecutionFailed {
                            transfer_id: transfer_id.to_hex(),
                            attempts,
                        }).await;
                        return ExecutionOutcome::Failed { transfer_id, attempts };
                    }
                }
            }
        }
    }

    async fn submit_and_confirm(&self, payload: &[u8]) -> Result<(), String> {
        let receipt: SubmissionReceipt = self
            .dest_rpc
            .submit_signed_transaction(payload)
            .await
            .map_err(|e| e.to_string())?;

        let deadline = tokio::time::Instant::now() + self.config.confirmation_timeout;
        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err("confirmation timed out".to_string());
            }
            let head = self.dest_rpc.get_latest_block().await.map_err(|e| e.to_string())?;
            if let Some(included_at) = receipt.included_at_height {
                if head.height.saturating_sub(included_at) >= self.config.finality_depth_dest {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }
}

fn now_unix_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
