//! In-Memory Backend
//!
//! Tag-indexed store with TTL expiration behind an async `RwLock`. It mimics
//! the application cache layer the harness targets: ids and tags are stored
//! under a prefix and every record also carries the sentinel tag.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{CacheEntry, TaggedCache};
use crate::catalog::SENTINEL_TAG;
use crate::error::Result;

#[derive(Debug, Default)]
struct Inner {
    /// Prefixed id -> entry
    entries: HashMap<String, CacheEntry>,
    /// Prefixed tag -> prefixed ids
    tag_index: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        Some(entry)
    }

    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.remove(&key);
        for tag in &entry.tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        self.entries.insert(key, entry);
    }
}

// == Memory Cache ==
#[derive(Debug)]
pub struct MemoryCache {
    prefix: String,
    inner: RwLock<Inner>,
}

impl MemoryCache {
    /// Creates an empty store that prefixes every id and tag with `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            inner: RwLock::new(Inner::default()),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

#[async_trait]
impl TaggedCache for MemoryCache {
    fn describe(&self) -> String {
        if self.prefix.is_empty() {
            "in-memory".to_string()
        } else {
            format!("in-memory (prefix '{}')", self.prefix)
        }
    }

    async fn save(
        &self,
        payload: &[u8],
        id: &str,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let mut stored_tags: Vec<String> = tags.iter().map(|t| self.key(t)).collect();
        stored_tags.push(self.key(SENTINEL_TAG));
        stored_tags.sort();
        stored_tags.dedup();

        let entry = CacheEntry::new(payload.to_vec(), stored_tags, ttl);
        self.inner.write().await.insert(self.key(id), entry);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let key = self.key(id);
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.entries.get(&key) else {
            return Ok(None);
        };
        if !entry.is_expired() {
            return Ok(Some(entry.payload.clone()));
        }
        inner.remove(&key);
        Ok(None)
    }

    async fn clean(&self, tag: &str) -> Result<()> {
        let tag = self.key(tag);
        let mut inner = self.inner.write().await;
        let keys: Vec<String> = inner
            .tag_index
            .get(&tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        for key in keys {
            inner.remove(&key);
        }
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut ids: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut tags: Vec<String> = inner
            .tag_index
            .iter()
            .filter(|(_, keys)| {
                keys.iter()
                    .any(|key| inner.entries.get(key).is_some_and(|e| !e.is_expired()))
            })
            .map(|(tag, _)| tag.clone())
            .collect();
        tags.sort();
        Ok(tags)
    }

    async fn ids_matching_tags(&self, tags: &[String]) -> Result<Vec<String>> {
        let Some((first, rest)) = tags.split_first() else {
            return Ok(Vec::new());
        };
        let inner = self.inner.read().await;
        let Some(candidates) = inner.tag_index.get(&self.key(first)) else {
            return Ok(Vec::new());
        };

        let rest: Vec<String> = rest.iter().map(|t| self.key(t)).collect();
        let mut ids: Vec<String> = candidates
            .iter()
            .filter(|key| {
                inner.entries.get(*key).is_some_and(|entry| {
                    !entry.is_expired() && rest.iter().all(|t| entry.has_tag(t))
                })
            })
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn flush_all(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.tag_index.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let cache = MemoryCache::new("");
        cache.save(b"hello", "k1", &[], None).await.unwrap();

        assert_eq!(cache.load("k1").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(cache.load("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_tags() {
        let cache = MemoryCache::new("");
        cache.save(b"v1", "k", &tags(&["A"]), None).await.unwrap();
        cache.save(b"v2", "k", &tags(&["B"]), None).await.unwrap();

        assert!(cache.ids_matching_tags(&tags(&["A"])).await.unwrap().is_empty());
        assert_eq!(cache.ids_matching_tags(&tags(&["B"])).await.unwrap(), vec!["k"]);
        assert_eq!(cache.list_ids().await.unwrap(), vec!["k"]);
    }

    #[tokio::test]
    async fn test_prefix_and_sentinel_in_listings() {
        let cache = MemoryCache::new("pfx_");
        cache
            .save(b"x", "id1", &tags(&["TAG_01", "TAG_02"]), None)
            .await
            .unwrap();

        assert_eq!(cache.list_ids().await.unwrap(), vec!["pfx_id1"]);
        assert_eq!(
            cache.list_tags().await.unwrap(),
            vec!["pfx_MAGE", "pfx_TAG_01", "pfx_TAG_02"]
        );
        assert_eq!(cache.load("id1").await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn test_clean_removes_only_tagged() {
        let cache = MemoryCache::new("");
        cache.save(b"1", "a", &tags(&["T1"]), None).await.unwrap();
        cache.save(b"2", "b", &tags(&["T1", "T2"]), None).await.unwrap();
        cache.save(b"3", "c", &tags(&["T2"]), None).await.unwrap();

        cache.clean("T1").await.unwrap();

        assert_eq!(cache.list_ids().await.unwrap(), vec!["c"]);
        assert!(!cache.list_tags().await.unwrap().contains(&"T1".to_string()));
    }

    #[tokio::test]
    async fn test_ids_matching_all_tags() {
        let cache = MemoryCache::new("");
        cache.save(b"1", "a", &tags(&["T1"]), None).await.unwrap();
        cache.save(b"2", "b", &tags(&["T1", "T2"]), None).await.unwrap();

        assert_eq!(
            cache.ids_matching_tags(&tags(&["T1"])).await.unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            cache.ids_matching_tags(&tags(&["T1", "T2"])).await.unwrap(),
            vec!["b"]
        );
        assert!(cache.ids_matching_tags(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new("");
        cache
            .save(b"x", "short", &[], Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(cache.load("short").await.unwrap(), None);
        assert!(cache.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_entries_hidden_from_listings() {
        let cache = MemoryCache::new("");
        cache.save(b"x", "gone", &[], Some(Duration::ZERO)).await.unwrap();
        cache
            .save(b"y", "kept", &[], Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(cache.list_ids().await.unwrap(), vec!["kept"]);
    }

    #[tokio::test]
    async fn test_tags_of_expired_entries_not_listed() {
        let cache = MemoryCache::new("");
        cache
            .save(b"x", "gone", &tags(&["OLD", "SHARED"]), Some(Duration::ZERO))
            .await
            .unwrap();
        cache
            .save(b"y", "kept", &tags(&["SHARED"]), None)
            .await
            .unwrap();

        assert_eq!(
            cache.list_tags().await.unwrap(),
            vec!["MAGE", "SHARED"]
        );

        cache.clean("SHARED").await.unwrap();
        assert!(cache.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_all() {
        let cache = MemoryCache::new("");
        cache.save(b"x", "a", &tags(&["T"]), None).await.unwrap();
        cache.flush_all().await.unwrap();

        assert!(cache.list_ids().await.unwrap().is_empty());
        assert!(cache.list_tags().await.unwrap().is_empty());
    }
}
