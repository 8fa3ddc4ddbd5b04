use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{ChainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// 32-byte SHA-256 digest.
pub type Hash256 = [u8; 32];

/// 20-byte RIPEMD-160 digest.
pub type Hash160 = [u8; 20];

/// The canonical "no previous block" sentinel.
pub const ZERO_HASH: Hash256 = [0u8; 32];

/// Current wall-clock time in seconds since the Unix epoch.
pub fn current_timestamp() -> Result<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ChainError::Crypto(format!("system time error: {e}")))?;
    Ok(duration.as_secs())
}

pub fn sha256_digest(data: &[u8]) -> Hash256 {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

pub fn ripemd160_digest(data: &[u8]) -> Hash160 {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// RIPEMD-160 over SHA-256, the classic short key-hash construction.
pub fn hash160(data: &[u8]) -> Hash160 {
    ripemd160_digest(&sha256_digest(data))
}

/// SHA-256 over the concatenation of two byte strings.
pub fn hash_concat(left: &[u8], right: &[u8]) -> Hash256 {
    let mut joined = Vec::with_capacity(left.len() + right.len());
    joined.extend_from_slice(left);
    joined.extend_from_slice(right);
    sha256_digest(&joined)
}

pub fn to_hex(data: &[u8]) -> String {
    HEXLOWER.encode(data)
}
