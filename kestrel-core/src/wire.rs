//! Serializer and Deserializer for the records this node stores off-chain.

// crates
use bincode::{
    config::{
        Bounded, DefaultOptions, FixintEncoding, LittleEndian, RejectTrailing, WithOtherEndian,
        WithOtherIntEncoding, WithOtherLimit, WithOtherTrailing,
    },
    Options,
};
use once_cell::sync::Lazy;
use serde::{de::DeserializeOwned, Serialize};

pub type Error = bincode::Error;

type BincodeOptions = WithOtherTrailing<
    WithOtherIntEncoding<
        WithOtherLimit<WithOtherEndian<DefaultOptions, LittleEndian>, Bounded>,
        FixintEncoding,
    >,
    RejectTrailing,
>;

// Metadata holds one uri per shard, 1MiB leaves room for thousands of them
const DATA_LIMIT: u64 = 1 << 20;

static OPTIONS: Lazy<BincodeOptions> = Lazy::new(|| {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_limit(DATA_LIMIT)
        .with_fixint_encoding()
        .reject_trailing_bytes()
});

/// Serialize an object directly into a vec
pub fn serialize<T: Serialize>(item: &T) -> Result<Vec<u8>, Error> {
    (*OPTIONS).serialize(item)
}

/// Deserialize an owned object from an in-memory slice
pub fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, Error> {
    (*OPTIONS).deserialize(data)
}
