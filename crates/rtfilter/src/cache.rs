//! Bounded cache of parsed expressions.
//!
//! Polling loops tend to evaluate the same expression text over and over;
//! the cache keeps the compiled form keyed by that text.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use super::error::FilterResult;
use super::expression::Expression;
use super::fields::FieldRegistry;

/// Default maximum number of cached expressions.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug)]
struct CacheEntry {
    expression: Arc<Expression>,
    /// Insertion sequence number, for oldest-first eviction.
    inserted: u64,
}

/// Thread-safe cache of compiled expressions.
///
/// Entries are never modified once inserted; when full, the oldest entry
/// is evicted. Failed parses are not cached.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rtfilter_rs::ExpressionCache;
///
/// let cache = ExpressionCache::new();
/// let first = cache.get_or_parse("is_complete=yes").unwrap();
/// let second = cache.get_or_parse("is_complete=yes").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct ExpressionCache {
    capacity: usize,
    registry: FieldRegistry,
    next_sequence: AtomicU64,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionCache {
    /// Creates a cache for the built-in torrent fields.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CAPACITY, FieldRegistry::torrent())
    }

    /// Creates a cache with a custom capacity and field registry.
    ///
    /// A capacity of zero disables caching.
    pub fn with_config(capacity: usize, registry: FieldRegistry) -> Self {
        Self {
            capacity,
            registry,
            next_sequence: AtomicU64::new(0),
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Returns the cached expression for `input`, parsing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the parse or compile error for invalid input.
    pub fn get_or_parse(&self, input: &str) -> FilterResult<Arc<Expression>> {
        if let Some(expression) = self.get(input) {
            trace!(input, "Expression cache hit");
            return Ok(expression);
        }

        let expression = Arc::new(Expression::parse_with(input, &self.registry)?);
        self.insert(input, Arc::clone(&expression));
        Ok(expression)
    }

    /// Returns a cached expression.
    pub fn get(&self, input: &str) -> Option<Arc<Expression>> {
        let entries = self.entries.read().ok()?;
        entries.get(input).map(|entry| Arc::clone(&entry.expression))
    }

    fn insert(&self, input: &str, expression: Arc<Expression>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(_) => return, // Lock poisoned, skip caching
        };

        // Another thread may have won the race; keep its entry.
        if entries.contains_key(input) {
            return;
        }

        if entries.len() >= self.capacity {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(key, _)| key.clone())
            {
                entries.remove(&oldest);
                trace!(input = %oldest, "Evicted oldest expression");
            }
        }

        let inserted = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            input.to_string(),
            CacheEntry {
                expression,
                inserted,
            },
        );
        debug!(input, cache_size = entries.len(), "Cached expression");
    }

    /// Returns the number of cached expressions.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}
