use std::collections::HashMap;

use log::trace;
use parking_lot::RwLock;

use crate::{error::Result, selector::Selector};

/// Selector text -> parsed selector, for callers that evaluate the same
/// configured selectors over and over (e.g. on every discovery lookup).
///
/// Only successful parses are stored. Safe to share between threads.
///
/// Entries are never evicted: the map holds one selector per distinct text
/// until [`clear`](Self::clear). Feed it a bounded set of configured
/// selectors, not untrusted or ever-changing text.
#[derive(Debug, Default)]
pub struct SelectorCache {
    entries: RwLock<HashMap<String, Selector>>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Cached selector for `text`, parsing and storing it on first use.
    pub fn get_or_parse(&self, text: &str) -> Result<Selector> {
        if let Some(selector) = self.entries.read().get(text) {
            trace!("selector cache hit for {text:?}");
            return Ok(selector.clone());
        }

        let selector = Selector::parse(text)?;
        self.entries
            .write()
            .entry(text.to_string())
            .or_insert_with(|| selector.clone());
        Ok(selector)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
