// crates
use reed_solomon_erasure::galois_8::ReedSolomon;
// internal
use kestrel_core::codec::{EncodedShards, ErasureCodec};

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    ReedSolomon(#[from] reed_solomon_erasure::Error),
    #[error("Data shard count must be positive")]
    NoDataShards,
    #[error("Not enough shards to reconstruct: {available} of {required}")]
    InsufficientShards { available: usize, required: usize },
    #[error("Original size {original_size} exceeds the {capacity} bytes held by the data shards")]
    OriginalSizeTooLarge { original_size: usize, capacity: usize },
}

/// GF(2^8) caps a codeword at 256 shards.
pub const MAX_TOTAL_SHARDS: usize = 256;

/// Systematic Reed-Solomon over GF(2^8). The blob is zero padded and split
/// into `data_shard_count` shards of `ceil(len / data_shard_count)` bytes.
/// Without parity shards the data shards are published as they are and every
/// one of them is needed to decode.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReedSolomonCodec;

impl ReedSolomonCodec {
    #[must_use]
    pub fn shard_size(blob_len: usize, data_shard_count: usize) -> usize {
        blob_len.div_ceil(data_shard_count).max(1)
    }
}

impl ErasureCodec for ReedSolomonCodec {
    type Error = CodecError;

    fn max_total_shards(&self) -> usize {
        MAX_TOTAL_SHARDS
    }

    fn encode(
        &self,
        blob: &[u8],
        data_shard_count: usize,
        parity_shard_count: usize,
    ) -> Result<EncodedShards, Self::Error> {
        if data_shard_count == 0 {
            return Err(CodecError::NoDataShards);
        }
        let shard_size = Self::shard_size(blob.len(), data_shard_count);

        let mut shards: Vec<Vec<u8>> = (0..data_shard_count + parity_shard_count)
            .map(|index| {
                let start = (index * shard_size).min(blob.len());
                let end = ((index + 1) * shard_size).min(blob.len());
                let mut shard = if index < data_shard_count {
                    blob[start..end].to_vec()
                } else {
                    Vec::with_capacity(shard_size)
                };
                shard.resize(shard_size, 0);
                shard
            })
            .collect();
        if parity_shard_count > 0 {
            ReedSolomon::new(data_shard_count, parity_shard_count)?.encode(&mut shards)?;
        }

        Ok(EncodedShards { shard_size, shards })
    }

    fn decode(
        &self,
        mut shards: Vec<Option<Vec<u8>>>,
        data_shard_count: usize,
        original_size: usize,
    ) -> Result<Vec<u8>, Self::Error> {
        if data_shard_count == 0 {
            return Err(CodecError::NoDataShards);
        }
        let available = shards.iter().filter(|shard| shard.is_some()).count();
        if available < data_shard_count || shards.len() < data_shard_count {
            return Err(CodecError::InsufficientShards {
                available,
                required: data_shard_count,
            });
        }
        let parity_shard_count = shards.len() - data_shard_count;
        if parity_shard_count > 0 {
            ReedSolomon::new(data_shard_count, parity_shard_count)?.reconstruct_data(&mut shards)?;
        }

        let mut blob: Vec<u8> = shards
            .into_iter()
            .take(data_shard_count)
            .flatten()
            .flatten()
            .collect();
        if original_size > blob.len() {
            return Err(CodecError::OriginalSizeTooLarge {
                original_size,
                capacity: blob.len(),
            });
        }
        blob.truncate(original_size);
        Ok(blob)
    }
}
