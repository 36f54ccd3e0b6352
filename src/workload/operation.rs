//! Operation Module
//!
//! The three operation kinds a client replays, and their persisted tuple
//! form: `["read", id]`, `["write", id, size, [tags]]`, `["clean", tag]`.

use std::fmt;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::{BenchError, Result};

// == Operation Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
    Clean,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Read,
        OperationKind::Write,
        OperationKind::Clean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Clean => "clean",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(OperationKind::Read),
            "write" => Some(OperationKind::Write),
            "clean" => Some(OperationKind::Clean),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Operation ==
/// One step of a client workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Load a record by id; a miss still counts
    Read { id: String },
    /// Re-save a record with a fresh payload of `size` bytes and its tags
    Write {
        id: String,
        size: usize,
        tags: Vec<String>,
    },
    /// Invalidate every record carrying `tag`
    Clean { tag: String },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Read { .. } => OperationKind::Read,
            Operation::Write { .. } => OperationKind::Write,
            Operation::Clean { .. } => OperationKind::Clean,
        }
    }

    /// Decodes one persisted tuple. `client` and `index` only feed the error.
    pub fn from_value(value: &Value, client: usize, index: usize) -> Result<Self> {
        let malformed = |reason: &str| BenchError::MalformedOperation {
            client,
            index,
            reason: reason.to_string(),
        };

        let fields = value
            .as_array()
            .ok_or_else(|| malformed("expected an array"))?;
        let kind_str = fields
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing operation kind"))?;
        let kind =
            OperationKind::parse(kind_str).ok_or_else(|| BenchError::UnknownOperationKind {
                client,
                index,
                kind: kind_str.to_string(),
            })?;

        let string_at = |pos: usize, what: &str| -> Result<String> {
            fields
                .get(pos)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| malformed(&format!("missing {}", what)))
        };

        match kind {
            OperationKind::Read => Ok(Operation::Read {
                id: string_at(1, "id")?,
            }),
            OperationKind::Write => {
                let id = string_at(1, "id")?;
                let size = fields
                    .get(2)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| malformed("missing size"))? as usize;
                let tags = match fields.get(3) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|t| {
                            t.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| malformed("non-string tag"))
                        })
                        .collect::<Result<Vec<_>>>()?,
                    Some(_) => return Err(malformed("tags must be an array")),
                };
                Ok(Operation::Write { id, size, tags })
            }
            OperationKind::Clean => Ok(Operation::Clean {
                tag: string_at(1, "tag")?,
            }),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Operation::Read { id } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(OperationKind::Read.as_str())?;
                seq.serialize_element(id)?;
                seq.end()
            }
            Operation::Write { id, size, tags } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(OperationKind::Write.as_str())?;
                seq.serialize_element(id)?;
                seq.serialize_element(size)?;
                seq.serialize_element(tags)?;
                seq.end()
            }
            Operation::Clean { tag } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(OperationKind::Clean.as_str())?;
                seq.serialize_element(tag)?;
                seq.end()
            }
        }
    }
}

/// Decodes a whole op file body for `client`.
pub fn decode_operations(values: &[Value], client: usize) -> Result<Vec<Operation>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| Operation::from_value(value, client, index))
        .collect()
}
