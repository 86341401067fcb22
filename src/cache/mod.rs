//! Correlation cache from workflow runs to their posted status messages.
//!
//! The cache is memory-only and intentionally lossy: when capacity is
//! exceeded the least recently used run loses its message thread, and later
//! events for it behave as if the run had never been seen.
//!
//! # Module Structure
//!
//! - [`lru`]: generic arena-backed LRU map

pub mod lru;

use std::num::NonZeroUsize;

use tracing::debug;

use crate::types::{MessageLocator, PostedMessage, RunKey, ValidationError};

pub use lru::LruCache;

/// Default number of runs remembered.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Maps a [`RunKey`] to the locator of its root status message.
#[derive(Debug)]
pub struct LocatorCache {
    entries: LruCache<RunKey, MessageLocator>,
}

impl LocatorCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        LocatorCache {
            entries: LruCache::new(capacity),
        }
    }

    /// Returns the locator for `key`, marking the run most recently used.
    ///
    /// `None` is the ordinary cache-miss outcome, not an error.
    pub fn get(&mut self, key: &RunKey) -> Option<MessageLocator> {
        self.entries.get(key).cloned()
    }

    /// Validates `posted` and stores it as the locator for `key`.
    ///
    /// The cache is left untouched when validation fails.
    pub fn set(&mut self, key: RunKey, posted: PostedMessage) -> Result<(), ValidationError> {
        let locator = MessageLocator::try_from(posted)?;
        if let Some((evicted, _)) = self.entries.insert(key, locator) {
            debug!(run = %key, evicted = %evicted, "Evicted least recently used run");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.capacity()
    }

    /// Entries from most to least recently used. For diagnostics only.
    pub fn entries(&self) -> impl Iterator<Item = (&RunKey, &MessageLocator)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RunKey> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &MessageLocator> + '_ {
        self.entries.values()
    }
}

impl Default for LocatorCache {
    fn default() -> Self {
        LocatorCache::new(DEFAULT_CACHE_CAPACITY)
    }
}
