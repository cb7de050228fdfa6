//! Cache Client Module
//!
//! Public face of the cache. Lookups go straight through the read side of the
//! lookup gate; mutations are queued to the cache actor.

use std::sync::{Arc, Mutex, PoisonError, RwLock as StdRwLock};
use std::time::Duration;

use axum::http::HeaderMap;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    ActorState, CacheActor, CacheCommand, CacheEntry, CacheState, CacheStats, CacheStrategy,
    StatsRecorder, DEFAULT_CAPACITY, DEFAULT_MAILBOX_SIZE, DEFAULT_SWEEP_INTERVAL,
};
use crate::error::{CacheError, Result};

// == Cache Config ==
/// Construction parameters of a cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Eviction strategy (only FIFO changes behaviour)
    pub strategy: CacheStrategy,
    /// Maximum number of stored entries
    pub capacity: usize,
    /// Period of the single-entry sweep
    pub sweep_interval: Duration,
    /// Commands the actor mailbox buffers before `add` waits
    pub mailbox_size: usize,
}

impl CacheConfig {
    /// FIFO cache of the given capacity with default timings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Rejects values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.mailbox_size == 0 {
            return Err(CacheError::InvalidConfig(
                "mailbox size must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: CacheStrategy::Fifo,
            capacity: DEFAULT_CAPACITY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            mailbox_size: DEFAULT_MAILBOX_SIZE,
        }
    }
}

// == Cache Client ==
/// Cloneable handle to a running cache.
///
/// ```ignore
/// let cache = CacheClient::new(CacheConfig::with_capacity(100))?;
/// let actor = cache.spawn();
/// cache.add("/index.html", headers, body).await?;
/// let hit = cache.check("/index.html").await;
/// cache.stop().await;
/// ```
#[derive(Clone)]
pub struct CacheClient {
    inner: Arc<Inner>,
}

struct Inner {
    /// Lookup gate: shared with the actor, which takes the write side
    state: Arc<RwLock<CacheState>>,
    /// None once the cache is stopped
    mailbox: StdRwLock<Option<mpsc::Sender<CacheCommand>>>,
    /// Actor waiting to be started by `run`
    actor: Mutex<Option<CacheActor>>,
    shutdown: watch::Sender<bool>,
    lifecycle: watch::Sender<ActorState>,
    stats: Arc<StatsRecorder>,
    strategy: CacheStrategy,
    capacity: usize,
}

impl CacheClient {
    // == Constructor ==
    /// Builds the cache and its actor. Nothing runs until `run` or `spawn`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        if !config.strategy.is_implemented() {
            warn!(
                "Cache strategy '{}' is not implemented yet, evicting in {} order",
                config.strategy,
                config.strategy.effective()
            );
        }

        let state = Arc::new(RwLock::new(CacheState::new(config.capacity)));
        let stats = Arc::new(StatsRecorder::new());
        let (mailbox_tx, mailbox_rx) = mpsc::channel(config.mailbox_size);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (lifecycle, _) = watch::channel(ActorState::Idle);

        let actor = CacheActor::new(
            state.clone(),
            mailbox_rx,
            shutdown_rx,
            stats.clone(),
            config.sweep_interval,
        );

        Ok(Self {
            inner: Arc::new(Inner {
                state,
                mailbox: StdRwLock::new(Some(mailbox_tx)),
                actor: Mutex::new(Some(actor)),
                shutdown,
                lifecycle,
                stats,
                strategy: config.strategy,
                capacity: config.capacity,
            }),
        })
    }

    // == Add ==
    /// Queues a response for caching under `key`.
    ///
    /// Waits while the actor mailbox is full. Returns once the command is
    /// queued, not once it is applied; use `flush` to wait for that.
    pub async fn add(
        &self,
        key: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Result<()> {
        let entry = CacheEntry::new(key, headers, body);
        self.submit(CacheCommand::Add(Arc::new(entry))).await
    }

    // == Check ==
    /// Looks up the entry stored under `key`.
    ///
    /// Takes only the read side of the lookup gate, so lookups never wait on
    /// each other, only on a mutation being applied.
    pub async fn check(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let found = self.inner.state.read().await.lookup(key);

        match found {
            Some(_) => self.inner.stats.record_hit(),
            None => self.inner.stats.record_miss(),
        }
        found
    }

    // == Clear ==
    /// Queues removal of every entry.
    pub async fn clear(&self) -> Result<()> {
        self.submit(CacheCommand::Clear).await
    }

    // == Flush ==
    /// Waits until every command queued before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.submit(CacheCommand::Flush(ack)).await?;
        done.await.map_err(|_| CacheError::Closed)
    }

    // == Run ==
    /// Runs the actor loop on the current task until `stop`.
    ///
    /// Fails with `Closed` after `stop`, and with `AlreadyRunning` if the
    /// loop was already started.
    pub async fn run(&self) -> Result<()> {
        let actor = {
            let mut slot = self
                .inner
                .actor
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if *self.inner.shutdown.borrow() {
                return Err(CacheError::Closed);
            }
            let actor = slot.take().ok_or(CacheError::AlreadyRunning)?;
            self.inner.lifecycle.send_replace(ActorState::Running);
            actor
        };

        let _guard = LifecycleGuard(&self.inner.lifecycle);
        actor.run().await;

        Ok(())
    }

    // == Spawn ==
    /// Runs the actor loop on a dedicated tokio task.
    pub fn spawn(&self) -> JoinHandle<Result<()>> {
        let client = self.clone();
        tokio::spawn(async move { client.run().await })
    }

    // == Stop ==
    /// Shuts the cache down.
    ///
    /// New submissions fail with `Closed` as soon as this is called. The
    /// actor finishes the command it is applying, exits, and this call
    /// returns once it has. Calling it again is a no-op.
    pub async fn stop(&self) {
        // Reject new submissions before touching the actor
        let sender = self
            .inner
            .mailbox
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            debug!("Cache already stopped");
        }
        drop(sender);

        let idle_actor = {
            let mut slot = self
                .inner
                .actor
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.inner.shutdown.send_replace(true);
            slot.take()
        };

        // Never started: dropping it releases the mailbox and wakes blocked senders
        if idle_actor.is_some() {
            drop(idle_actor);
            self.inner.lifecycle.send_replace(ActorState::Stopped);
        }

        let mut lifecycle = self.inner.lifecycle.subscribe();
        let _ = lifecycle
            .wait_for(|state| *state == ActorState::Stopped)
            .await;

        info!("Cache stopped");
    }

    // == Accessors ==
    /// Current lifecycle of the actor loop.
    pub fn actor_state(&self) -> ActorState {
        *self.inner.lifecycle.borrow()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.inner.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.state.read().await.is_empty()
    }

    /// Snapshot of the cache counters.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.len().await;
        self.inner.stats.snapshot(total_entries)
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.inner.strategy
    }

    /// Sends a command to the actor, waiting for mailbox space.
    async fn submit(&self, command: CacheCommand) -> Result<()> {
        let sender = self
            .inner
            .mailbox
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CacheError::Closed)?;

        sender.send(command).await.map_err(|_| CacheError::Closed)
    }
}

/// Marks the actor stopped when `run` returns or is cancelled.
struct LifecycleGuard<'a>(&'a watch::Sender<ActorState>);

impl Drop for LifecycleGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(ActorState::Stopped);
    }
}
