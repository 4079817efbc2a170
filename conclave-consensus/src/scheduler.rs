//! Block production scheduling
//!
//! The scheduler owns the block cadence: a periodic tick that assembles a
//! block whenever this node is the leader, the one-time genesis bootstrap,
//! and the liveness watchdog that hands a silent leader over to the elector.

use crate::config::ConsensusConfig;
use crate::elector::LeaderElector;
use crate::traits::BlockAssembler;
use crate::ConsensusResult;
use conclave_core::{now_secs, ChainView};
use conclave_network::ValidatorRegistry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Gate deciding whether this node currently attempts to build blocks.
///
/// Toggled by election outcomes on any task; a single atomic cell with
/// last-writer-wins semantics.
#[derive(Debug, Default)]
pub struct ProductionGate {
    enabled: AtomicBool,
}

impl ProductionGate {
    /// Create a gate with production disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow block production (idempotent)
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Stop block production (idempotent)
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Whether this node should currently attempt to build blocks
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Periodic block-production driver
pub struct BlockScheduler {
    config: Arc<ConsensusConfig>,
    registry: Arc<ValidatorRegistry>,
    chain: Arc<ChainView>,
    assembler: Arc<dyn BlockAssembler>,
    elector: Arc<LeaderElector>,
    gate: Arc<ProductionGate>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BlockScheduler {
    /// Create a scheduler; nothing runs until [`start`](Self::start)
    pub fn new(
        config: Arc<ConsensusConfig>,
        registry: Arc<ValidatorRegistry>,
        chain: Arc<ChainView>,
        assembler: Arc<dyn BlockAssembler>,
        elector: Arc<LeaderElector>,
        gate: Arc<ProductionGate>,
    ) -> Self {
        Self {
            config,
            registry,
            chain,
            assembler,
            elector,
            gate,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the cadence timer, the liveness watchdog, and the initial
    /// leader discovery. No-op unless this node is a validator.
    pub fn start(&self) -> ConsensusResult<()> {
        self.config.validate()?;

        if !self.registry.is_self_validator() {
            info!("Node is not a validator, block production stays disabled");
            return Ok(());
        }

        info!(
            round_secs = self.config.round_secs,
            "Node is a validator, starting block production scheduler"
        );

        let handles = vec![
            self.spawn_cadence(),
            self.spawn_watchdog(),
            self.spawn_discovery(),
        ];
        self.tasks.lock().extend(handles);
        Ok(())
    }

    /// Stop all scheduler tasks and wait for them to exit
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Scheduler task ended abnormally");
            }
        }
    }

    fn spawn_cadence(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let chain = self.chain.clone();
        let assembler = self.assembler.clone();
        let gate = self.gate.clone();
        let shutdown = self.shutdown.clone();

        // After a restart the node rejoins the global cadence mid-round: the
        // first tick fires when the current round ends, not a full round
        // from now.
        let initial_delay = match chain.block_time() {
            Some(last) => Duration::from_secs(
                config
                    .round_secs
                    .saturating_sub(now_secs().saturating_sub(last)),
            ),
            None => Duration::ZERO,
        };
        debug!(delay_secs = initial_delay.as_secs(), "Scheduling cadence timer");

        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + initial_delay, config.round_duration());
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticks.tick() => {}
                }

                if !gate.is_enabled() {
                    continue;
                }

                if chain.block_hash().is_none() {
                    if config.genesis_authority {
                        info!("No block observed yet, building genesis block");
                        if let Err(e) = assembler.build_genesis() {
                            error!(error = %e, "Genesis assembly failed");
                        }
                    } else {
                        debug!("No block observed yet, waiting for the genesis authority");
                    }
                } else if let Err(e) = assembler.pack(now_secs()) {
                    error!(error = %e, "Block assembly failed");
                }
            }
        })
    }

    fn spawn_watchdog(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let chain = self.chain.clone();
        let elector = self.elector.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let check_interval = config.liveness_check_interval();
            let staleness = config.staleness_threshold_secs();

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(check_interval) => {}
                }

                let Some(last) = chain.block_time() else {
                    continue;
                };

                let elapsed = now_secs().saturating_sub(last);
                if elapsed >= staleness {
                    warn!(
                        elapsed,
                        staleness, "No block within the expected window, leader considered unresponsive"
                    );
                    if let Err(e) = elector.handle_leader_timeout().await {
                        error!(error = %e, "Leader failover attempt failed");
                    }
                }
            }
        })
    }

    fn spawn_discovery(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let elector = self.elector.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    result = elector.discover_leader() => match result {
                        Ok(Some(leader)) => {
                            info!(%leader, "Initial leader discovery settled");
                            return;
                        }
                        Ok(None) => debug!("Leader discovery did not converge, retrying"),
                        Err(e) => warn!(error = %e, "Leader discovery failed, retrying"),
                    }
                }

                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(config.discovery_retry()) => {}
                }
            }
        })
    }
}
