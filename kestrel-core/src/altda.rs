//! Commitments handed to rollups that use this node as an alternative DA layer.
//!
//! Layout: `[GENERIC_COMMITMENT_TYPE, VERSION_BYTE, metadata_uri...]`.

pub const GENERIC_COMMITMENT_TYPE: u8 = 0x01;
pub const VERSION_BYTE: u8 = 0x0c;

const HEADER_LEN: usize = 2;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("Commitment too short: {0} bytes")]
    TooShort(usize),
    #[error("Unknown commitment type {0:#04x}")]
    UnknownType(u8),
    #[error("Unknown commitment version {0:#04x}")]
    UnknownVersion(u8),
    #[error("Commitment payload is not a valid uri")]
    InvalidUri,
}

#[must_use]
pub fn encode_commitment(metadata_uri: &str) -> Vec<u8> {
    let mut commitment = Vec::with_capacity(HEADER_LEN + metadata_uri.len());
    commitment.push(GENERIC_COMMITMENT_TYPE);
    commitment.push(VERSION_BYTE);
    commitment.extend_from_slice(metadata_uri.as_bytes());
    commitment
}

/// Both header bytes must match, the uri must be non-empty utf-8.
pub fn decode_commitment(commitment: &[u8]) -> Result<String, CommitmentError> {
    let [kind, version, uri @ ..] = commitment else {
        return Err(CommitmentError::TooShort(commitment.len()));
    };
    if *kind != GENERIC_COMMITMENT_TYPE {
        return Err(CommitmentError::UnknownType(*kind));
    }
    if *version != VERSION_BYTE {
        return Err(CommitmentError::UnknownVersion(*version));
    }
    if uri.is_empty() {
        return Err(CommitmentError::TooShort(commitment.len()));
    }
    String::from_utf8(uri.to_vec()).map_err(|_| CommitmentError::InvalidUri)
}
