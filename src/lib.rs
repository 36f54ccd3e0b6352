//! Tagbench - A benchmark harness for tag-indexed caches
//!
//! Synthesizes a seeded dataset and per-client operation mixes, replays them
//! concurrently against a cache under test, and aggregates throughput and
//! tag-query latency.

pub mod backend;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod report;
pub mod runner;
pub mod script;
pub mod store;
pub mod tagquery;
pub mod workload;

pub use backend::{connect, HttpCache, MemoryCache, TaggedCache};
pub use catalog::TagCatalog;
pub use config::{BackendKind, Config, InitParams};
pub use error::{BenchError, Result};
pub use report::{ClientResult, TagTiming, Throughput};
