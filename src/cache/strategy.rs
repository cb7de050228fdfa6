//! Eviction Strategy Module

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::CacheError;

// == Cache Strategy ==
/// Eviction strategy selected at construction time.
///
/// Only `Fifo` has its own eviction behaviour. `Lru` and `Lfu` are accepted
/// configuration values that are not implemented yet and evict in FIFO order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheStrategy {
    /// First in, first out
    #[default]
    Fifo,
    /// Least recently used (falls back to FIFO)
    Lru,
    /// Least frequently used (falls back to FIFO)
    Lfu,
}

impl CacheStrategy {
    /// Parses a strategy name, degrading unknown names to `Fifo`.
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("Unknown cache strategy '{}', using fifo", name);
            Self::Fifo
        })
    }

    /// Returns true if this strategy has its own eviction order.
    pub fn is_implemented(&self) -> bool {
        matches!(self, Self::Fifo)
    }

    /// Strategy whose eviction order is actually applied.
    pub fn effective(&self) -> Self {
        if self.is_implemented() {
            *self
        } else {
            Self::Fifo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::Lru => "lru",
            Self::Lfu => "lfu",
        }
    }
}

impl FromStr for CacheStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown cache strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("fifo".parse::<CacheStrategy>().unwrap(), CacheStrategy::Fifo);
        assert_eq!("LRU".parse::<CacheStrategy>().unwrap(), CacheStrategy::Lru);
        assert_eq!(" lfu ".parse::<CacheStrategy>().unwrap(), CacheStrategy::Lfu);
    }

    #[test]
    fn test_parse_unknown_name_is_error() {
        let result = "random".parse::<CacheStrategy>();
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_lossy_falls_back_to_fifo() {
        assert_eq!(CacheStrategy::parse_lossy("arc"), CacheStrategy::Fifo);
        assert_eq!(CacheStrategy::parse_lossy("lru"), CacheStrategy::Lru);
    }

    #[test]
    fn test_effective_strategy() {
        assert_eq!(CacheStrategy::Fifo.effective(), CacheStrategy::Fifo);
        assert_eq!(CacheStrategy::Lru.effective(), CacheStrategy::Fifo);
        assert_eq!(CacheStrategy::Lfu.effective(), CacheStrategy::Fifo);
    }

    #[test]
    fn test_display_round_trips() {
        for strategy in [CacheStrategy::Fifo, CacheStrategy::Lru, CacheStrategy::Lfu] {
            assert_eq!(strategy.to_string().parse::<CacheStrategy>().unwrap(), strategy);
        }
    }
}
