//! Process-lifetime tree cache with in-flight build coalescing.
//!
//! Each key owns its own slot in a sharded concurrent map. A shard is held
//! only long enough to fetch or insert a slot, never during a build, so
//! lookups and builds for unrelated keys run in parallel. Concurrent
//! requests for the same key wait on that key's slot and reuse the first
//! caller's result.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::normalize::normalize;
use crate::tree::ProvisionTree;
use crate::types::TreeKey;

/// Cache key: the tree key plus a hash of the raw extract.
///
/// A changed extract produces a new key; populated entries are never
/// replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub tree: TreeKey,
    /// Lowercase hex SHA-256 of the raw extract bytes.
    pub content_hash: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(tree: &TreeKey, raw: &str) -> Self {
        Self {
            tree: tree.clone(),
            content_hash: content_hash(raw),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.content_hash.get(..12).unwrap_or(&self.content_hash);
        write!(f, "{} #{short}", self.tree)
    }
}

/// SHA-256 of `raw`, hex encoded.
#[must_use]
pub fn content_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

type Slot = Arc<OnceLock<Result<Arc<ProvisionTree>>>>;

/// Shared cache of built provision trees.
#[derive(Default)]
pub struct TreeCache {
    slots: DashMap<CacheKey, Slot>,
    builds: AtomicUsize,
}

impl TreeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tree for `key` built from `raw`, building it at most once
    /// per distinct extract.
    ///
    /// # Arguments
    /// * `raw` - The extract markup
    /// * `key` - Section, year and source format of the extract
    ///
    /// # Returns
    /// The shared tree. Every caller asking for the same key and bytes gets
    /// the same `Arc`, including callers that arrive while it is building.
    ///
    /// # Errors
    /// Any normalization error. Failed builds are not retained, so a later
    /// call builds again.
    pub fn get_or_build(&self, raw: &str, key: &TreeKey) -> Result<Arc<ProvisionTree>> {
        let cache_key = CacheKey::new(key, raw);
        // The shard guard is released at the end of this statement.
        let slot = Arc::clone(&self.slots.entry(cache_key.clone()).or_default());

        let result = slot
            .get_or_init(|| {
                self.builds.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %cache_key, "Building provision tree");
                normalize(raw, key).map(Arc::new)
            })
            .clone();

        if let Err(err) = &result {
            tracing::warn!(key = %cache_key, error = %err, "Provision tree build failed");
            self.slots
                .remove_if(&cache_key, |_, current| Arc::ptr_eq(current, &slot));
        }

        result
    }

    /// Whether a built tree is present for this extract.
    #[must_use]
    pub fn contains(&self, raw: &str, key: &TreeKey) -> bool {
        self.slots
            .get(&CacheKey::new(key, raw))
            .is_some_and(|slot| matches!(slot.value().get(), Some(Ok(_))))
    }

    /// Number of cached entries, in-flight builds included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of builds started since the cache was created.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for TreeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCache")
            .field("entries", &self.len())
            .field("builds", &self.build_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::SourceFormat;

    const SECTION: &str = "/us/usc/t18/s922";
    const RAW: &str = r#"<div><p class="statutory-body">(a) Text.</p></div>"#;

    fn key(year: i32) -> TreeKey {
        TreeKey::new(SECTION, year, SourceFormat::Styled)
    }

    #[test]
    fn test_second_request_reuses_tree() {
        let cache = TreeCache::new();
        let first = cache.get_or_build(RAW, &key(2020)).unwrap();
        let second = cache.get_or_build(RAW, &key(2020)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.build_count(), 1);
        assert!(cache.contains(RAW, &key(2020)));
    }

    #[test]
    fn test_changed_extract_gets_new_entry() {
        let cache = TreeCache::new();
        let old = cache.get_or_build(RAW, &key(2020)).unwrap();
        let changed = r#"<div><p class="statutory-body">(a) Other text.</p></div>"#;
        let new = cache.get_or_build(changed, &key(2020)).unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(cache.len(), 2);
        assert_eq!(old.get(&format!("{SECTION}/a")).unwrap().text, "Text.");
    }

    #[test]
    fn test_failed_build_is_not_retained() {
        let cache = TreeCache::new();
        let result = cache.get_or_build("<div><p", &key(2020));

        assert!(matches!(result, Err(CoreError::XmlParse(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_requests_coalesce() {
        let cache = TreeCache::new();
        let trees: Vec<Arc<ProvisionTree>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_build(RAW, &key(2020)).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.build_count(), 1);
        assert!(trees.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_unrelated_keys_build_in_parallel() {
        let cache = TreeCache::new();
        std::thread::scope(|scope| {
            for year in [2010, 2015, 2020, 2025] {
                let cache = &cache;
                scope.spawn(move || cache.get_or_build(RAW, &key(year)).unwrap());
            }
        });

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.build_count(), 4);
        assert!([2010, 2015, 2020, 2025]
            .iter()
            .all(|year| cache.contains(RAW, &key(*year))));
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
