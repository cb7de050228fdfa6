//! Cache Actor Module
//!
//! Single owner of every cache mutation. Adds, clears and the periodic sweep
//! are applied one at a time, in the order they reach the actor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheState, StatsRecorder};

// == Commands ==
/// Messages accepted by the actor mailbox.
#[derive(Debug)]
pub enum CacheCommand {
    /// Store a response, evicting the oldest entry if the cache is full
    Add(Arc<CacheEntry>),
    /// Drop every entry
    Clear,
    /// Acknowledge once every earlier command has been applied
    Flush(oneshot::Sender<()>),
}

// == Actor State ==
/// Lifecycle of the actor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Created, loop not started
    Idle,
    /// Loop is processing commands
    Running,
    /// Loop has exited; terminal
    Stopped,
}

/// One turn of the actor loop.
enum Event {
    Command(CacheCommand),
    Sweep,
    Shutdown,
    MailboxClosed,
}

// == Cache Actor ==
/// Mutation loop of the cache.
pub struct CacheActor {
    state: Arc<RwLock<CacheState>>,
    mailbox: mpsc::Receiver<CacheCommand>,
    shutdown: watch::Receiver<bool>,
    stats: Arc<StatsRecorder>,
    sweep_interval: Duration,
}

impl CacheActor {
    pub fn new(
        state: Arc<RwLock<CacheState>>,
        mailbox: mpsc::Receiver<CacheCommand>,
        shutdown: watch::Receiver<bool>,
        stats: Arc<StatsRecorder>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            state,
            mailbox,
            shutdown,
            stats,
            sweep_interval,
        }
    }

    // == Run ==
    /// Processes commands and sweep ticks until shutdown is signalled or
    /// every sender is gone.
    ///
    /// Shutdown is polled first on every turn, and a command is always
    /// applied to completion before the next turn, so cancellation lands
    /// between mutations. Commands still queued at that point are dropped.
    ///
    /// A due sweep tick is taken before the next command. It is ready at
    /// most once per interval, so a busy mailbox can neither starve it nor
    /// be starved by it.
    pub async fn run(mut self) {
        // First sweep one full period after start, not immediately
        let start = Instant::now() + self.sweep_interval;
        let mut sweep = time::interval_at(start, self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Cache actor started with sweep interval of {} seconds",
            self.sweep_interval.as_secs()
        );

        loop {
            let event = tokio::select! {
                biased;

                _ = self.shutdown.changed() => Event::Shutdown,
                _ = sweep.tick() => Event::Sweep,
                command = self.mailbox.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => Event::MailboxClosed,
                },
            };

            match event {
                Event::Command(command) => self.apply(command).await,
                Event::Sweep => self.sweep().await,
                Event::Shutdown => {
                    debug!("Cache actor received shutdown signal");
                    break;
                }
                Event::MailboxClosed => {
                    debug!("Cache mailbox closed");
                    break;
                }
            }
        }

        info!("Cache actor stopped");
    }

    // == Apply ==
    /// Applies one command under the write side of the lookup gate.
    async fn apply(&mut self, command: CacheCommand) {
        match command {
            CacheCommand::Add(entry) => {
                let key = entry.key.clone();
                let evicted = {
                    let mut state = self.state.write().await;
                    state.insert(entry)
                };

                if let Some(evicted) = evicted {
                    self.stats.record_eviction();
                    debug!("Cache full: evicted '{}' to admit '{}'", evicted.key, key);
                } else {
                    debug!("Cached '{}'", key);
                }
            }
            CacheCommand::Clear => {
                let removed = self.state.write().await.clear();
                info!("Cache cleared: removed {} entries", removed);
            }
            CacheCommand::Flush(ack) => {
                // Receiver may have given up waiting
                let _ = ack.send(());
            }
        }
    }

    // == Sweep ==
    /// Evicts the single oldest entry, if any.
    async fn sweep(&mut self) {
        let evicted = self.state.write().await.evict_oldest();

        match evicted {
            Some(entry) => {
                self.stats.record_expiration();
                info!(
                    "Sweep: evicted '{}' after {} ms in cache",
                    entry.key,
                    entry.age_ms()
                );
            }
            None => debug!("Sweep: cache is empty"),
        }
    }
}
