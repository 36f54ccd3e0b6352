//! Operation Generator Module
//!
//! Produces each client's deterministic operation sequence from the catalog,
//! the record set and the frequency lists, all shared read-only.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::TagCatalog;
use crate::dataset::{FrequencyList, GeneratedDataset, Record};
use crate::workload::Operation;

/// Odd multiplier spreading client indices across the seed space.
const CLIENT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed of the independent stream used by client `client`.
pub fn client_seed(seed: u64, client: usize) -> u64 {
    seed ^ (client as u64 + 1).wrapping_mul(CLIENT_SEED_STRIDE)
}

// == Operation Mix ==
/// Chance factors of the op mix. A clean happens when a draw from
/// `[0, clean_factor]` is zero; otherwise a write when a draw from
/// `[0, write_factor]` is zero; otherwise a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationMix {
    pub clean_factor: u32,
    pub write_factor: u32,
}

impl OperationMix {
    /// Expected fraction of cleans.
    pub fn clean_probability(&self) -> f64 {
        1.0 / (f64::from(self.clean_factor) + 1.0)
    }

    /// Expected fraction of writes, given that cleans are checked first.
    pub fn write_probability(&self) -> f64 {
        (1.0 - self.clean_probability()) / (f64::from(self.write_factor) + 1.0)
    }
}

// == Operation Generator ==
pub struct OperationGenerator<'a> {
    catalog: &'a TagCatalog,
    reads: &'a FrequencyList,
    writes: &'a FrequencyList,
    records: HashMap<&'a str, &'a Record>,
    mix: OperationMix,
}

impl<'a> OperationGenerator<'a> {
    pub fn new(dataset: &'a GeneratedDataset, mix: OperationMix) -> Self {
        let records = dataset
            .records
            .iter()
            .map(|r| (r.id.as_str(), r))
            .collect();
        Self {
            catalog: &dataset.catalog,
            reads: &dataset.reads,
            writes: &dataset.writes,
            records,
            mix,
        }
    }

    /// Generates exactly `num_ops` operations for `client`, drawing from the
    /// stream seeded by [`client_seed`].
    pub fn generate_client_ops(&self, client: usize, num_ops: usize, seed: u64) -> Vec<Operation> {
        let mut rng = StdRng::seed_from_u64(client_seed(seed, client));
        (0..num_ops).map(|_| self.next_operation(&mut rng)).collect()
    }

    /// One decision of the op state machine: clean, else write, else read.
    ///
    /// Falls through to the next kind when the source it would sample from is
    /// empty, so the sequence length never depends on the dataset.
    pub fn next_operation<R: Rng + ?Sized>(&self, rng: &mut R) -> Operation {
        if rng.gen_range(0..=self.mix.clean_factor) == 0 {
            if let Some(tag) = self.pick_tag(rng) {
                return Operation::Clean {
                    tag: tag.to_string(),
                };
            }
        }

        if rng.gen_range(0..=self.mix.write_factor) == 0 {
            let record = self
                .writes
                .sample(rng)
                .and_then(|id| self.records.get(id).copied());
            if let Some(record) = record {
                return Operation::Write {
                    id: record.id.clone(),
                    size: record.payload_size(),
                    tags: record.tags.clone(),
                };
            }
        }

        let id = self.reads.sample(rng).unwrap_or_default();
        Operation::Read { id: id.to_string() }
    }

    /// Cleans pick uniformly from the whole catalog, not by popularity.
    fn pick_tag<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'a str> {
        if self.catalog.is_empty() {
            return None;
        }
        self.catalog.get(rng.gen_range(0..self.catalog.len()))
    }
}
