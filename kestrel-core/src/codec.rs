/// Output of an erasure encoding: equally sized shards, data shards first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedShards {
    pub shard_size: usize,
    pub shards: Vec<Vec<u8>>,
}

pub trait ErasureCodec {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Largest number of data plus parity shards a single encoding can hold.
    fn max_total_shards(&self) -> usize {
        usize::MAX
    }

    fn encode(
        &self,
        blob: &[u8],
        data_shard_count: usize,
        parity_shard_count: usize,
    ) -> Result<EncodedShards, Self::Error>;

    /// `shards` is sparse and indexed by shard position, `None` marks a missing shard.
    fn decode(
        &self,
        shards: Vec<Option<Vec<u8>>>,
        data_shard_count: usize,
        original_size: usize,
    ) -> Result<Vec<u8>, Self::Error>;
}
