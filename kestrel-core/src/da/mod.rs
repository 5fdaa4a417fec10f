pub mod commitment;
pub mod metadata;
pub mod published;

pub use commitment::{double_hash, hash, recovered_data_hash, Digest};
pub use metadata::Metadata;
pub use published::{PublishedData, PublishedDataStatus};

/// Position of a shard in `[0, data_shard_count + parity_shard_count)`.
pub type ShardIndex = usize;
