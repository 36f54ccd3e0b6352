//! Tag Catalog
//!
//! The fixed universe of tag identifiers for one run. Built once, either from
//! a requested size or from the tags currently held by the cache under test,
//! and then passed by reference to every consumer.

use std::collections::BTreeSet;

use crate::error::{BenchError, Result};

/// Tag every record saved through the application layer carries. It says
/// nothing about user tagging and is never benchmarked.
pub const SENTINEL_TAG: &str = "MAGE";

/// Label prefix of generated tags.
pub const TAG_LABEL: &str = "TAG_";

// == Tag Catalog ==
/// Ordered, duplicate-free list of tags plus the longest tag length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCatalog {
    tags: Vec<String>,
    longest: usize,
}

impl TagCatalog {
    /// Generates `count` sequential labels `TAG_1..=TAG_count`, zero-padded to
    /// the digit length of `count` so that lexical and numeric order agree.
    pub fn generate(count: usize) -> Self {
        let width = count.to_string().len();
        let tags = (1..=count)
            .map(|i| format!("{TAG_LABEL}{i:0width$}"))
            .collect();
        Self::from_sorted(tags)
    }

    /// Rebuilds the catalog from the raw tags of a populated cache.
    ///
    /// Strips `prefix` from each tag, drops the sentinel tag, and returns the
    /// result sorted and de-duplicated. Tags that do not start with `prefix`
    /// are kept unchanged.
    pub fn derive_from_live_tags<I, S>(raw_tags: I, prefix: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: BTreeSet<String> = raw_tags
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                raw.strip_prefix(prefix).unwrap_or(raw).to_string()
            })
            .filter(|tag| tag != SENTINEL_TAG && !tag.is_empty())
            .collect();

        if tags.is_empty() {
            return Err(BenchError::EmptyCatalog);
        }
        Ok(Self::from_sorted(tags.into_iter().collect()))
    }

    fn from_sorted(tags: Vec<String>) -> Self {
        let longest = tags.iter().map(String::len).max().unwrap_or(0);
        Self { tags, longest }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tags.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Length of the longest tag, used to align per-tag report columns.
    pub fn longest_tag_len(&self) -> usize {
        self.longest
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}
