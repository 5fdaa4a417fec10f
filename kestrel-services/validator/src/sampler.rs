// internal
use kestrel_core::da::{hash, ShardIndex};
use kestrel_utils::fisheryates::FisherYatesShuffle;

/// Shards `validator` must prove for a record of `shard_count` shards.
///
/// The permutation is seeded with `H(validator)` and the first
/// `min(threshold, shard_count)` entries are taken. The chain recomputes the
/// same assignment to check submitted proofs, so this must stay bit compatible.
#[must_use]
pub fn sample_indices(validator: &str, threshold: usize, shard_count: usize) -> Vec<ShardIndex> {
    let entropy = hash(validator.as_bytes());
    let mut indices = FisherYatesShuffle::new(entropy).permutation(shard_count);
    indices.truncate(threshold.min(shard_count));
    indices
}
