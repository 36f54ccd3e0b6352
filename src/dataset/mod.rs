//! Dataset Module
//!
//! Synthetic record set and the weighted id lists that drive sampling.

mod frequency;
mod generator;
mod record;


pub use frequency::FrequencyList;
pub use generator::{
    generate, record_id, DatasetShape, GeneratedDataset, EXPIRY_OUTCOMES, MAX_WEIGHT, MIN_WEIGHT,
};
pub use record::{synthesize_payload, Record, StoredRecord};
