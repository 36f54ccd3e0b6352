//! Error types for the benchmark harness
//!
//! Provides unified error handling using thiserror. Every variant aborts the
//! current command; nothing is retried.

use std::path::PathBuf;

use thiserror::Error;

// == Bench Error Enum ==
/// Unified error type for the benchmark harness.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Named dataset or op file does not exist on disk
    #[error("The '{name}' test data does not exist ({path}). Please run the 'init' command.")]
    MissingDataset { name: String, path: PathBuf },

    /// Cache under test holds no benchmarkable tags
    #[error("No cache tags found in cache. Populate it with the 'load' command first.")]
    EmptyCatalog,

    /// Cache under test holds no records
    #[error("No cache records found in cache. Populate it with the 'load' command first.")]
    EmptyDataset,

    /// Persisted operation carries a kind this harness does not know
    #[error("Invalid op '{kind}' at index {index} for client {client}")]
    UnknownOperationKind {
        client: usize,
        index: usize,
        kind: String,
    },

    /// Persisted operation has the right kind but wrong fields
    #[error("Malformed op at index {index} for client {client}: {reason}")]
    MalformedOperation {
        client: usize,
        index: usize,
        reason: String,
    },

    /// Results file holds two results for the same client, i.e. several runs
    #[error("Results of test '{name}' contain client {client} more than once ({path}). Clear the results before rerunning the clients.")]
    DuplicateClientResult {
        name: String,
        client: usize,
        path: PathBuf,
    },

    /// Command-line parameter outside its valid domain
    #[error("Invalid parameter --{name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Cache under test reported a failure
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Transport failure talking to a remote cache
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem failure on a persisted artifact
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted artifact is not valid JSON for its schema
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BenchError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a JSON error with the path of the offending file.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        BenchError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        BenchError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the harness.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dataset_message_names_dataset() {
        let err = BenchError::MissingDataset {
            name: "nightly".to_string(),
            path: PathBuf::from("var/cachebench/nightly/data.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("'nightly'"));
        assert!(msg.contains("init"));
    }

    #[test]
    fn test_unknown_operation_kind_message() {
        let err = BenchError::UnknownOperationKind {
            client: 3,
            index: 17,
            kind: "delete".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid op 'delete' at index 17 for client 3");
    }

    #[test]
    fn test_invalid_parameter_helper() {
        let err = BenchError::invalid_parameter("keys", "must be at least 1");
        assert_eq!(err.to_string(), "Invalid parameter --keys: must be at least 1");
    }
}
