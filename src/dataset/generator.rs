//! Dataset Generator Module
//!
//! Builds the synthetic record set together with the read-popularity and
//! write-volatility frequency lists used for skewed sampling.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::catalog::TagCatalog;
use crate::config::InitParams;
use crate::dataset::{synthesize_payload, FrequencyList, Record};

/// Expiry is a uniform pick among this many outcomes; exactly one of them
/// means "expires".
pub const EXPIRY_OUTCOMES: u32 = 6;

/// Inclusive bounds of the per-record popularity and volatility weights.
pub const MIN_WEIGHT: u64 = 1;
pub const MAX_WEIGHT: u64 = 100;

/// Bytes of the id digest kept in the hex id.
const ID_DIGEST_BYTES: usize = 16;

// == Dataset Shape ==
/// The subset of [`InitParams`] that determines the record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetShape {
    pub num_keys: usize,
    pub num_tags: usize,
    pub min_tags: usize,
    pub max_tags: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub min_ttl: u64,
    pub max_ttl: u64,
}

impl From<&InitParams> for DatasetShape {
    fn from(params: &InitParams) -> Self {
        Self {
            num_keys: params.num_keys,
            num_tags: params.num_tags,
            min_tags: params.min_tags,
            max_tags: params.max_tags,
            min_size: params.min_size,
            max_size: params.max_size,
            min_ttl: params.min_ttl,
            max_ttl: params.max_ttl,
        }
    }
}

// == Generated Dataset ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDataset {
    pub catalog: TagCatalog,
    /// Records in generation order
    pub records: Vec<Record>,
    /// Popularity-weighted ids, sampled for reads
    pub reads: FrequencyList,
    /// Volatility-weighted ids, sampled for writes
    pub writes: FrequencyList,
}

impl GeneratedDataset {
    /// Total payload bytes across all records.
    pub fn payload_bytes(&self) -> usize {
        self.records.iter().map(Record::payload_size).sum()
    }
}

/// Deterministic id of the `index`-th record: hex of a truncated SHA-256 of
/// the decimal index.
pub fn record_id(index: usize) -> String {
    let digest = Sha256::digest(index.to_string().as_bytes());
    hex::encode(&digest[..ID_DIGEST_BYTES])
}

// == Generate ==
/// Generates the dataset for `shape` from `seed`.
///
/// The same seed and shape always produce identical records and frequency
/// lists. Per record the draws happen in a fixed order: expiry, payload size,
/// payload content, tag count, tag subset, popularity, volatility.
pub fn generate(shape: &DatasetShape, seed: u64) -> GeneratedDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let catalog = TagCatalog::generate(shape.num_tags);

    let mut records = Vec::with_capacity(shape.num_keys);
    let mut reads = FrequencyList::new();
    let mut writes = FrequencyList::new();

    for i in 0..shape.num_keys {
        let id = record_id(i);

        let expires = draw_expiry(&mut rng, shape.min_ttl, shape.max_ttl);
        let size = rng.gen_range(shape.min_size..=shape.max_size);
        let data = synthesize_payload(&mut rng, size);
        let tags = draw_tags(&mut rng, &catalog, shape.min_tags, shape.max_tags);

        // Some keys are read more frequently, some written more frequently
        let popularity = rng.gen_range(MIN_WEIGHT..=MAX_WEIGHT);
        let volatility = rng.gen_range(MIN_WEIGHT..=MAX_WEIGHT);
        reads.push(id.clone(), popularity);
        writes.push(id.clone(), volatility);

        records.push(Record {
            id,
            data,
            tags,
            expires,
        });
    }

    debug!(
        "Generated {} records over {} tags (read weight {}, write weight {})",
        records.len(),
        catalog.len(),
        reads.total_weight(),
        writes.total_weight()
    );

    GeneratedDataset {
        catalog,
        records,
        reads,
        writes,
    }
}

/// Five of six outcomes never expire; the sixth expires after a uniform
/// number of seconds in `[min_ttl, max_ttl]`.
fn draw_expiry<R: Rng + ?Sized>(rng: &mut R, min_ttl: u64, max_ttl: u64) -> Option<u64> {
    if rng.gen_range(0..EXPIRY_OUTCOMES) == EXPIRY_OUTCOMES - 1 {
        Some(rng.gen_range(min_ttl..=max_ttl))
    } else {
        None
    }
}

/// Picks between `min` and `max` distinct tags uniformly without
/// replacement, returned in catalog order.
fn draw_tags<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &TagCatalog,
    min: usize,
    max: usize,
) -> Vec<String> {
    let max = max.min(catalog.len());
    let min = min.min(max);
    let count = rng.gen_range(min..=max);
    if count == 0 {
        return Vec::new();
    }

    let mut picked = index::sample(rng, catalog.len(), count).into_vec();
    picked.sort_unstable();
    picked
        .into_iter()
        .filter_map(|i| catalog.get(i).map(str::to_string))
        .collect()
}
