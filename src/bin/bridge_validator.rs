//! Process entry point (spec.md §1, §6.3): thin by design. Parses CLI
//! overrides, loads and validates `NodeConfig`, initializes tracing, loads
//! the keystore, constructs the six component tasks and their channels,
//! and awaits them on a `tokio::select!` alongside ctrl-c.
//!
//! The CLI launcher proper (subcommands for key generation, directory
//! inspection, manual emergency acknowledgment) is out of scope here —
//! this binary only ever runs the validator loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use bridge_aggregator::{AggregatorConfig, IncomingSignature, SignatureAggregator};
use bridge_chain::{ChainObserver, InMemoryCheckpoint, ObserverConfig};
use bridge_config::{Cli, NodeConfig};
use bridge_core::{ChainId, Direction, HealthEvent};
use bridge_crypto::{Ed25519Keystore, Keystore};
use bridge_execution::{ConcatenatedTxBuilder, Executor, ExecutorConfig};
use bridge_failsafe::{FailsafeConfig, FailsafeController};
use bridge_gossip::{run_inbound_loop, GossipMessage, GossipNetwork, LoopbackTransport};
use bridge_store::{CoordinationStore, InMemoryCoordinationStore, SnapshotRetentionConfig, SnapshotStore};
use bridge_telemetry::NodeMetrics;
use bridge_validator::{EventValidator, ValidatorConfig};

mod collaborators;
mod rpc_placeholder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let config = match NodeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 1;
        }
    };
    if let Err(err) = config.validate(cli.i_know_what_im_doing) {
        eprintln!("configuration error: {err}");
        return 1;
    }

    bridge_telemetry::init_tracing(&config.security_level);
    tracing::info!(validator_id = %config.validator_id, "starting bridge validator node");

    let keystore = match Ed25519Keystore::from_file(&config.key_file) {
        Ok(keystore) => Arc::new(keystore),
        Err(err) => {
            tracing::error!(error = %err, "failed to load keystore");
            return 2;
        }
    };

    match run_node(config, keystore).await {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "unrecoverable emergency shutdown");
            3
        }
    }
}

async fn run_node(config: NodeConfig, keystore: Arc<Ed25519Keystore>) -> anyhow::Result<()> {
    let metrics = Arc::new(NodeMetrics::new());

    // Peer signatures arrive over gossip carrying only a transfer id, not
    // the full transfer; folding one into the aggregator needs the locally
    // observed `Transfer` it refers to. Populated by `validate_and_sign_loop`
    // on local acceptance, read by the gossip consumer task.
    let transfer_cache: Arc<dashmap::DashMap<bridge_core::TransferId, bridge_core::Transfer>> =
        Arc::new(dashmap::DashMap::new());

    let coordination: Arc<dyn CoordinationStore> = Arc::new(InMemoryCoordinationStore::new());
    let snapshot_retention = SnapshotRetentionConfig::new(config.snapshot_retention())
        .context("invalid snapshot retention")?;
    let snapshots = Arc::new(SnapshotStore::new(snapshot_retention));

    let (health_tx, health_rx) = mpsc::channel::<HealthEvent>(256);
    let (sealed_tx, sealed_rx) = mpsc::channel(256);
    let (incoming_sig_tx, incoming_sig_rx) = mpsc::channel::<IncomingSignature>(256);
    let (gossip_out_tx, mut gossip_out_rx) = mpsc::channel::<GossipMessage>(256);
    let (gossip_in_tx, gossip_in_rx) = mpsc::channel::<GossipMessage>(256);
    let (gossip_consumer_tx, mut gossip_consumer_rx) = mpsc::channel::<GossipMessage>(256);
    let (l1_events_tx, mut l1_events_rx) = mpsc::channel(256);
    let (l2_events_tx, mut l2_events_rx) = mpsc::channel(256);

    let aggregator = Arc::new(SignatureAggregator::new(
        AggregatorConfig { threshold: config.threshold, total_validators: config.total_validators },
        health_tx.clone(),
        sealed_tx,
    ));

    let failsafe = Arc::new(FailsafeController::new(
        FailsafeConfig { max_auto_responses: config.max_auto_responses, periodic_snapshot_interval_ms: 5 * 60_000 },
        Arc::new(collaborators::StoreBackedSnapshotTrigger::new(coordination.clone(), snapshots.clone())),
        Arc::new(collaborators::LoggingResponseExecutor::new(coordination.clone())),
    ));

    let gossip_transport = Arc::new(LoopbackTransport::new());
    let gossip_network = Arc::new(GossipNetwork::new(gossip_transport, Duration::from_secs(120)));

    let source_rpc = Arc::new(rpc_placeholder::PlaceholderChainRpc::new());
    let dest_rpc = Arc::new(rpc_placeholder::PlaceholderChainRpc::new());

    let l1_observer = ChainObserver::new(
        ObserverConfig { source_chain: ChainId(1), dest_chain: ChainId(2), direction: Direction::L1ToL2, ..Default::default() },
        source_rpc.clone(),
        Arc::new(InMemoryCheckpoint::starting_at(0)),
        l1_events_tx,
        health_tx.clone(),
    );
    let l2_observer = ChainObserver::new(
        ObserverConfig { source_chain: ChainId(2), dest_chain: ChainId(1), direction: Direction::L2ToL1, ..Default::default() },
        dest_rpc.clone(),
        Arc::new(InMemoryCheckpoint::starting_at(0)),
        l2_events_tx,
        health_tx.clone(),
    );

    let validator = Arc::new(EventValidator::new(
        ValidatorConfig {
            min_transfer: 1,
            max_transfer: u128::MAX,
            per_sender_cap: u128::MAX,
            per_epoch_aggregate_cap: u128::MAX,
            expected_address_len: std::collections::HashMap::new(),
        },
        Arc::new(bridge_validator::AntiReplayTable::new()),
        Arc::new(collaborators::RpcBackedProofChecker::new(source_rpc.clone(), dest_rpc.clone())),
        Arc::new(collaborators::StoreBackedPolicy::new()),
        Arc::new(collaborators::StoreBackedVolumeLedger::new()),
        Arc::new(collaborators::FailsafeBackedSecuritySignals::new(failsafe.clone())),
    ));

    let executor = Arc::new(Executor::new(
        ExecutorConfig {
            threshold: config.threshold,
            peer_heartbeat_ttl_ms: 30_000,
            finality_depth_dest: config.finality_depth_dest,
            confirmation_timeout: Duration::from_secs(300),
            max_retries: 5,
        },
        dest_rpc.clone(),
        Arc::new(ConcatenatedTxBuilder),
        coordination.clone(),
        health_tx.clone(),
    ));

    let (observer_shutdown_tx1, observer_shutdown_rx1) = mpsc::channel(1);
    let (observer_shutdown_tx2, observer_shutdown_rx2) = mpsc::channel(1);

    let l1_task = tokio::spawn(l1_observer.run(observer_shutdown_rx1));
    let l2_task = tokio::spawn(l2_observer.run(observer_shutdown_rx2));

    let aggregator_task = {
        let aggregator = aggregator.clone();
        tokio::spawn(bridge_aggregator::aggregator::run(aggregator, incoming_sig_rx))
    };

    let gossip_inbound_task = tokio::spawn(run_inbound_loop(gossip_network.clone(), gossip_in_rx, gossip_consumer_tx));

    let failsafe_task = {
        let failsafe = failsafe.clone();
        tokio::spawn(failsafe.run(health_rx, wall_clock_ms))
    };

    let executor_task = {
        let executor = executor.clone();
        tokio::spawn(async move {
            executor.run(sealed_rx).await;
        })
    };

    let validator_task = {
        let validator = validator.clone();
        let keystore = keystore.clone();
        let incoming_sig_tx = incoming_sig_tx.clone();
        let gossip_out_tx = gossip_out_tx.clone();
        let validator_id = config.validator_id.clone();
        let metrics = metrics.clone();
        let transfer_cache = transfer_cache.clone();
        tokio::spawn(async move {
            validate_and_sign_loop(
                validator,
                keystore,
                validator_id,
                &mut l1_events_rx,
                &mut l2_events_rx,
                incoming_sig_tx,
                gossip_out_tx,
                metrics,
                transfer_cache,
            )
            .await;
        })
    };

    let gossip_consumer_task = {
        let incoming_sig_tx = incoming_sig_tx.clone();
        let transfer_cache = transfer_cache.clone();
        tokio::spawn(async move {
            while let Some(message) = gossip_consumer_rx.recv().await {
                if let GossipMessage::Signature(broadcast) = message {
                    let Some(signature) = collaborators::decode_signature_broadcast(&broadcast) else { continue };
                    let Some(transfer) = transfer_cache.get(&signature.transfer_id).map(|t| t.clone()) else {
                        tracing::debug!(transfer_id = %signature.transfer_id, "peer signature for a transfer we haven't observed yet, dropping");
                        continue;
                    };
                    let _ = incoming_sig_tx.send(IncomingSignature { transfer, signature }).await;
                }
            }
        })
    };

    let gossip_publish_task = tokio::spawn(async move {
        while let Some(message) = gossip_out_rx.recv().await {
            gossip_network.publish(message).await;
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    drop(observer_shutdown_tx1);
    drop(observer_shutdown_tx2);
    l1_task.abort();
    l2_task.abort();
    aggregator_task.abort();
    gossip_inbound_task.abort();
    gossip_consumer_task.abort();
    gossip_publish_task.abort();
    failsafe_task.abort();
    executor_task.abort();
    validator_task.abort();

    Ok(())
}

fn wall_clock_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// The per-`transfer_id` total-ordering task (spec §5: "receive → validate
/// → sign → broadcast → threshold-check"): drains both observers, runs the
/// six-check pipeline, signs accepted transfers locally, and forwards the
/// local signature both to the aggregator and onto the gossip-out channel.
#[allow(clippy::too_many_arguments)]
async fn validate_and_sign_loop(
    validator: Arc<EventValidator>,
    keystore: Arc<Ed25519Keystore>,
    validator_id: String,
    l1_events: &mut mpsc::Receiver<bridge_chain::ObservedEvent>,
    l2_events: &mut mpsc::Receiver<bridge_chain::ObservedEvent>,
    incoming_sig_tx: mpsc::Sender<IncomingSignature>,
    gossip_out_tx: mpsc::Sender<GossipMessage>,
    metrics: Arc<NodeMetrics>,
    transfer_cache: Arc<dashmap::DashMap<bridge_core::TransferId, bridge_core::Transfer>>,
) {
    loop {
        let observed = tokio::select! {
            Some(event) = l1_events.recv() => event,
            Some(event) = l2_events.recv() => event,
            else => return,
        };

        let transfer = observed.transfer;
        match validator.validate(&transfer).await {
            bridge_validator::ValidationOutcome::Rejected(reason) => {
                tracing::info!(transfer_id = %transfer.id, reason = ?reason, "transfer rejected");
                continue;
            }
            bridge_validator::ValidationOutcome::Accepted => {}
        }
        metrics.record_transfer_validated();
        transfer_cache.insert(transfer.id, transfer.clone());

        let message_hash = transfer.canonical_hash();
        let signature_bytes = keystore.sign(&message_hash);
        let signature = bridge_core::ValidatorSignature {
            transfer_id: transfer.id,
            validator_id: validator_id.clone(),
            public_key: keystore.public_key(),
            signature: signature_bytes,
            signed_at: wall_clock_ms(),
            message_hash,
        };
        metrics.record_signature_issued();

        let _ = incoming_sig_tx
            .send(IncomingSignature { transfer: transfer.clone(), signature: signature.clone() })
            .await;

        let broadcast = collaborators::encode_signature_broadcast(&signature);
        let _ = gossip_out_tx.send(GossipMessage::Signature(broadcast)).await;
    }
}

