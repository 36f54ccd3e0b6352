//! Tag-Query Benchmark
//!
//! Times one "ids matching this tag" query per tag currently in the cache.
//! Separate from the op replay; it runs against whatever the cache holds.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::TaggedCache;
use crate::catalog::TagCatalog;
use crate::error::{BenchError, Result};
use crate::report::TagTiming;

/// What the cache held when the benchmark started.
#[derive(Debug, Clone)]
pub struct CacheSurvey {
    pub catalog: TagCatalog,
    pub id_count: usize,
    pub elapsed: Duration,
}

impl CacheSurvey {
    pub fn line(&self) -> String {
        format!(
            "Counted {} cache IDs and {} cache tags in {:.4} seconds",
            self.id_count,
            self.catalog.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Reads the live tag catalog and id count.
///
/// Fails with `EmptyCatalog` when no user tags remain after stripping
/// `prefix` and the sentinel tag, and with `EmptyDataset` when the cache
/// holds no ids.
pub async fn survey(cache: &dyn TaggedCache, prefix: &str) -> Result<CacheSurvey> {
    let start = Instant::now();
    let raw_tags = cache.list_tags().await?;
    let catalog = TagCatalog::derive_from_live_tags(&raw_tags, prefix)?;

    let id_count = cache.list_ids().await?.len();
    if id_count == 0 {
        return Err(BenchError::EmptyDataset);
    }

    Ok(CacheSurvey {
        catalog,
        id_count,
        elapsed: start.elapsed(),
    })
}

/// Times a single-tag query for every tag, in sorted catalog order.
pub async fn run(catalog: &TagCatalog, cache: &dyn TaggedCache) -> Result<Vec<TagTiming>> {
    let mut timings = Vec::with_capacity(catalog.len());
    for tag in catalog.iter() {
        let query = [tag.to_string()];
        let start = Instant::now();
        let ids = cache.ids_matching_tags(&query).await?;
        let elapsed = start.elapsed();

        timings.push(TagTiming {
            tag: tag.to_string(),
            elapsed,
            matched: ids.len(),
        });
    }
    debug!("Timed {} tag queries", timings.len());
    Ok(timings)
}
