// crates
use blake2::{digest::consts::U32, Blake2b, Digest as _};
use sha2::Sha256;
// internal

pub type Digest = [u8; 32];

type Blake2b256 = Blake2b<U32>;

/// Domain hash `H` applied to shard bytes.
#[must_use]
pub fn hash(data: &[u8]) -> Digest {
    Blake2b256::digest(data).into()
}

/// On-chain shard commitment, `H(H(shard))`.
#[must_use]
pub fn double_hash(data: &[u8]) -> Digest {
    hash(&hash(data))
}

/// Integrity tag of a whole blob. Uses a different function than `H` so
/// the tag can never be confused with a shard commitment.
#[must_use]
pub fn recovered_data_hash(blob: &[u8]) -> Digest {
    Sha256::digest(blob).into()
}
