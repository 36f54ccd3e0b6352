//! Configuration Module
//!
//! Handles harness configuration from environment variables and the
//! parameters that shape a generated dataset.

use std::env;
use std::path::PathBuf;

use crate::error::{BenchError, Result};

// == Backend Kind ==
/// Which cache-under-test adapter the harness talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Remote cache speaking the REST contract in `backend::http`
    Http,
    /// In-process store, only meaningful within a single `bench` run
    Memory,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Some(BackendKind::Http),
            "memory" | "mem" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

/// Harness configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one sub-directory per named test
    pub base_dir: PathBuf,
    /// Cache adapter used by load/tags/ops/bench
    pub backend: BackendKind,
    /// Base URL of the remote cache for the HTTP adapter
    pub cache_url: String,
    /// Prefix the cache puts in front of every stored tag and id
    pub tag_prefix: String,
    /// Per-request timeout in seconds for the HTTP adapter
    pub timeout_secs: u64,
    /// Program name written into generated run scripts
    pub program: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TAGBENCH_DIR` - Base directory for named tests (default: var/cachebench)
    /// - `TAGBENCH_BACKEND` - `http` or `memory` (default: http)
    /// - `TAGBENCH_CACHE_URL` - Remote cache URL (default: http://127.0.0.1:3000)
    /// - `TAGBENCH_TAG_PREFIX` - Cache tag/id prefix (default: empty)
    /// - `TAGBENCH_TIMEOUT_SECS` - HTTP timeout in seconds (default: 30)
    /// - `TAGBENCH_BIN` - Program name used in run.sh (default: tagbench)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_dir: env::var("TAGBENCH_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            backend: env::var("TAGBENCH_BACKEND")
                .ok()
                .and_then(|v| BackendKind::parse(&v))
                .unwrap_or(defaults.backend),
            cache_url: env::var("TAGBENCH_CACHE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_url),
            tag_prefix: env::var("TAGBENCH_TAG_PREFIX").unwrap_or(defaults.tag_prefix),
            timeout_secs: env::var("TAGBENCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            program: env::var("TAGBENCH_BIN")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.program),
        }
    }

    /// Directory of one named test.
    pub fn test_dir(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("var/cachebench"),
            backend: BackendKind::Http,
            cache_url: "http://127.0.0.1:3000".to_string(),
            tag_prefix: String::new(),
            timeout_secs: 30,
            program: "tagbench".to_string(),
        }
    }
}

// == Init Parameters ==
/// Parameters of one dataset + workload generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    pub name: String,
    pub num_keys: usize,
    pub num_tags: usize,
    /// At most `num_tags`
    pub min_tags: usize,
    /// Capped at `num_tags` during generation
    pub max_tags: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub num_clients: usize,
    pub num_ops: usize,
    /// Write when a draw from `[0, write_factor]` is zero
    pub write_factor: u32,
    /// Clean when a draw from `[0, clean_factor]` is zero
    pub clean_factor: u32,
    /// Lower bound in seconds for records that expire
    pub min_ttl: u64,
    /// Upper bound in seconds for records that expire
    pub max_ttl: u64,
    /// Fixed seed; `None` draws one from entropy at init time
    pub seed: Option<u64>,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            num_keys: 10_000,
            num_tags: 2_000,
            min_tags: 0,
            max_tags: 15,
            min_size: 1,
            max_size: 1024,
            num_clients: 4,
            num_ops: 100_000,
            write_factor: 1_000,
            clean_factor: 5_000,
            min_ttl: 10,
            max_ttl: 14_400,
            seed: None,
        }
    }
}

impl InitParams {
    /// Rejects parameter combinations no generation pass can satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) || self.name == ".." {
            return Err(BenchError::invalid_parameter(
                "name",
                format!("'{}' is not a usable directory name", self.name),
            ));
        }
        for (flag, value) in [
            ("keys", self.num_keys),
            ("tags", self.num_tags),
            ("clients", self.num_clients),
            ("ops", self.num_ops),
        ] {
            if value == 0 {
                return Err(BenchError::invalid_parameter(flag, "must be at least 1"));
            }
        }
        if self.min_tags > self.max_tags {
            return Err(BenchError::invalid_parameter(
                "min-tags",
                format!("{} exceeds --max-tags {}", self.min_tags, self.max_tags),
            ));
        }
        if self.min_tags > self.num_tags {
            return Err(BenchError::invalid_parameter(
                "min-tags",
                format!("{} exceeds --tags {}", self.min_tags, self.num_tags),
            ));
        }
        if self.min_size > self.max_size {
            return Err(BenchError::invalid_parameter(
                "min-rec-size",
                format!("{} exceeds --max-rec-size {}", self.min_size, self.max_size),
            ));
        }
        if self.min_ttl == 0 || self.min_ttl > self.max_ttl {
            return Err(BenchError::invalid_parameter(
                "min-ttl",
                format!(
                    "expected 1 <= min-ttl <= max-ttl, got {}..{}",
                    self.min_ttl, self.max_ttl
                ),
            ));
        }
        Ok(())
    }
}
