//! Keccak-256 digests for commitments and quorum keys.

use sha3::{Digest as _, Keccak256};

/// A 32-byte Keccak-256 digest.
pub type Digest = [u8; 32];

/// Hash `data` with Keccak-256.
pub fn keccak256(data: &[u8]) -> Digest {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Keccak256::digest(data));
    digest
}
