//! Utility functions and helpers
//!
//! This module contains the canonical byte codec, hashing and hex helpers,
//! and EC key management used throughout the chain engine.

pub mod crypto;
pub mod keys;
pub mod serialization;

pub use crypto::{
    current_timestamp, hash160, hash_concat, ripemd160_digest, sha256_digest, to_hex, Hash160,
    Hash256, ZERO_HASH,
};
pub use keys::{
    crypto_init, crypto_shutdown, generate_default_keypair, generate_ec_keypair, sign_message,
    verify_message, KeyPair, DEFAULT_CURVE,
};
pub use serialization::{ByteReader, ByteWriter};
