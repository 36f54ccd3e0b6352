//! Workload Replayer Module
//!
//! Runs one client's operation sequence against the cache under test,
//! strictly one operation at a time, timing every call.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::backend::TaggedCache;
use crate::dataset::synthesize_payload;
use crate::error::Result;
use crate::report::ClientResult;
use crate::workload::Operation;

/// Replays `ops` for client `client` and returns its timing buckets.
///
/// Only the cache call itself is inside the timed window; payload synthesis
/// for writes happens before the clock starts. A read miss is counted like a
/// hit. The first failing cache call aborts the replay and no partial result
/// is returned.
pub async fn replay(
    client: usize,
    ops: &[Operation],
    cache: &dyn TaggedCache,
) -> Result<ClientResult> {
    let mut result = ClientResult::new(client);
    let mut rng = StdRng::seed_from_u64(client as u64);
    let mut misses = 0u64;

    for op in ops {
        let elapsed = match op {
            Operation::Read { id } => {
                let start = Instant::now();
                let loaded = cache.load(id).await?;
                let elapsed = start.elapsed();
                if loaded.is_none() {
                    misses += 1;
                }
                elapsed
            }
            Operation::Write { id, size, tags } => {
                let payload = synthesize_payload(&mut rng, *size);
                let start = Instant::now();
                cache.save(payload.as_bytes(), id, tags, None).await?;
                start.elapsed()
            }
            Operation::Clean { tag } => {
                let start = Instant::now();
                cache.clean(tag).await?;
                start.elapsed()
            }
        };
        result.record(op.kind(), elapsed);
    }

    debug!(
        "Client {} replayed {} ops ({} read misses)",
        client,
        ops.len(),
        misses
    );
    Ok(result)
}
