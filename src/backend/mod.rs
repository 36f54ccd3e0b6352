//! Cache Backend Module
//!
//! The interface the harness drives the cache under test through, plus the
//! adapters that implement it.

mod entry;
mod http;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{BackendKind, Config};
use crate::error::Result;

pub use entry::CacheEntry;
pub use http::{HttpCache, TAGS_HEADER, TTL_HEADER};
pub use memory::MemoryCache;

/// Cache under test.
///
/// Ids and tags passed in are the logical names the harness generated.
/// `list_ids` and `list_tags` return whatever the cache stores internally,
/// which may include a prefix and system tags.
#[async_trait]
pub trait TaggedCache: Send + Sync {
    /// Short description shown before a load.
    fn describe(&self) -> String;

    /// Stores `payload` under `id` with `tags` and an optional lifetime.
    async fn save(
        &self,
        payload: &[u8],
        id: &str,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Returns the payload, or `None` on a miss.
    async fn load(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Invalidates every record carrying `tag`.
    async fn clean(&self, tag: &str) -> Result<()>;

    async fn list_ids(&self) -> Result<Vec<String>>;

    async fn list_tags(&self) -> Result<Vec<String>>;

    /// Ids of records carrying all of `tags`.
    async fn ids_matching_tags(&self, tags: &[String]) -> Result<Vec<String>>;

    /// Removes everything.
    async fn flush_all(&self) -> Result<()>;
}

/// Builds the adapter selected by `config`.
pub fn connect(config: &Config) -> Result<Arc<dyn TaggedCache>> {
    match config.backend {
        BackendKind::Http => Ok(Arc::new(HttpCache::new(
            &config.cache_url,
            Duration::from_secs(config.timeout_secs),
        )?)),
        BackendKind::Memory => Ok(Arc::new(MemoryCache::new(&config.tag_prefix))),
    }
}
