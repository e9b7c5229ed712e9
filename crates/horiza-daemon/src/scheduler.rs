// crates/horiza-daemon/src/scheduler.rs
//
// Epoch scheduler for the Horiza Protocol daemon.
//
// Polls the engine at a fixed interval. Once an epoch duration has elapsed
// it advances the clock as the operator, distributes that epoch's emission,
// writes the holder snapshot, and persists the engine. A daemon that was
// down for several epochs catches up one epoch at a time, so every missed
// epoch still gets its own distribution.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};

use horiza_core::{Address, Timestamp};
use horiza_rpc::{EngineHandle, TimeSource};

use crate::epoch_events::EpochEvent;
use crate::error::DaemonResult;
use crate::persistence::StateStore;
use crate::state::{NodeState, NodeStateMachine};

/// Drives epoch advances and emission distribution.
pub struct EpochScheduler {
    engine: EngineHandle,
    store: StateStore,
    clock: TimeSource,
    /// Account the scheduler acts as; must hold the operator role.
    operator: Address,
    poll_interval: Duration,
    events: broadcast::Sender<EpochEvent>,
    lifecycle: Arc<Mutex<NodeStateMachine>>,
}

impl EpochScheduler {
    pub fn new(
        engine: EngineHandle,
        store: StateStore,
        operator: Address,
        events: broadcast::Sender<EpochEvent>,
        lifecycle: Arc<Mutex<NodeStateMachine>>,
    ) -> Self {
        Self {
            engine,
            store,
            clock: horiza_rpc::system_time(),
            operator,
            poll_interval: Duration::from_secs(30),
            events,
            lifecycle,
        }
    }

    pub fn with_clock(mut self, clock: TimeSource) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the scheduler loop until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Epoch scheduler started (poll_interval={}s, operator={})",
            self.poll_interval.as_secs(),
            self.operator
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Epoch scheduler received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!("Epoch scheduler tick failed: {}", e);
                    }
                }
            }
        }
    }

    /// Advance and distribute every epoch that is due. Returns the number of
    /// epochs advanced.
    pub async fn tick(&self) -> DaemonResult<u64> {
        let now = (self.clock)();
        let (epoch_due, distribution_due) = self
            .engine
            .call(move |e| (e.epoch_due(now), e.distribution_due()))
            .await?;
        if !epoch_due && !distribution_due {
            return Ok(0);
        }

        self.lifecycle.lock().await.transition(NodeState::Advancing)?;
        let result = self.catch_up(now).await;
        {
            let mut lifecycle = self.lifecycle.lock().await;
            // Shutdown may have started while the engine was busy.
            if lifecycle.current == NodeState::Advancing {
                lifecycle.transition(NodeState::Ready)?;
            }
        }
        result
    }

    async fn catch_up(&self, now: Timestamp) -> DaemonResult<u64> {
        let operator = self.operator;
        let mut advanced = 0;

        loop {
            if self.engine.call(|e| e.distribution_due()).await? {
                self.distribute(now).await?;
            }
            if !self.engine.call(move |e| e.epoch_due(now)).await? {
                break;
            }
            let epoch = self
                .engine
                .execute(move |e| e.update_epoch(&operator, now))
                .await?;
            advanced += 1;
            let _ = self.events.send(EpochEvent::EpochAdvanced { epoch, at: now });
        }

        self.persist().await?;
        Ok(advanced)
    }

    async fn distribute(&self, now: Timestamp) -> DaemonResult<()> {
        let operator = self.operator;
        let split = self
            .engine
            .execute(move |e| e.distribute_emission(&operator, now))
            .await?;
        let _ = self.events.send(EpochEvent::EmissionDistributed { split });

        let snapshot = self.engine.call(|e| e.snapshot()).await?;
        let path = self.store.write_snapshot(&snapshot)?;
        let _ = self.events.send(EpochEvent::SnapshotWritten {
            epoch: snapshot.epoch,
            holders: snapshot.holders.len(),
            path,
        });
        Ok(())
    }

    /// Save the current engine state.
    pub async fn persist(&self) -> DaemonResult<PathBuf> {
        let (state, ledger) = self.engine.export().await?;
        self.store.save(state, ledger)
    }
}
