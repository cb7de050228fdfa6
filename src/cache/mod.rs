//! Cache Module
//!
//! Bounded response cache with FIFO eviction, actor-owned mutation and
//! concurrent lookups.

mod actor;
mod client;
mod entry;
mod index;
mod sequence;
mod state;
mod stats;
mod strategy;


use std::time::Duration;

// Re-export public types
pub use actor::{ActorState, CacheActor, CacheCommand};
pub use client::{CacheClient, CacheConfig};
pub use entry::CacheEntry;
pub use index::CacheIndex;
pub use sequence::SequencedStore;
pub use state::CacheState;
pub use stats::{CacheStats, StatsRecorder};
pub use strategy::CacheStrategy;

// == Public Constants ==
/// Default maximum number of cached responses
pub const DEFAULT_CAPACITY: usize = 100;

/// Default period of the staleness sweep (5 minutes)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default number of queued mutations before `add` waits
pub const DEFAULT_MAILBOX_SIZE: usize = 32;
