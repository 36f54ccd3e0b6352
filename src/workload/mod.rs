//! Workload Module
//!
//! Per-client operation sequences: their model, their generation from a
//! dataset, and their timed replay against a cache.

mod generator;
mod operation;
mod replay;

pub use generator::{client_seed, OperationGenerator, OperationMix};
pub use operation::{decode_operations, Operation, OperationKind};
pub use replay::replay;
