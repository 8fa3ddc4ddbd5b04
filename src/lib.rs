//! # Astral Chain
//!
//! A minimal, single-node blockchain engine: an in-memory ordered sequence
//! of cryptographically linked blocks that validates every append and can
//! be restored from a durable, crash-tolerant block log.
//!
//! ## How the code is organized
//! - `core/`: blocks, transactions, the Merkle tree, chain validation, and
//!   proof-of-work mining
//! - `storage/`: the length-framed, checksummed append-only block log
//! - `utils/`: the canonical byte codec, hashing, and EC key management
//! - `config/`: environment-driven runtime configuration
//! - `error/`: the engine-wide error type
//!
//! ## Typical flow
//! ```no_run
//! use astral_chain::{make_genesis_block, BlockStore, Chain, ChainConfig};
//!
//! # fn main() -> astral_chain::Result<()> {
//! astral_chain::crypto_init()?;
//!
//! let mut store = BlockStore::open("./data")?;
//! let mut chain = Chain::new(ChainConfig::default());
//! chain.restore_from_store(&store)?;
//!
//! if chain.height() == 0 {
//!     let genesis = make_genesis_block("astral: first light", 1_700_000_000);
//!     chain
//!         .append_and_store(genesis, &mut store)
//!         .expect("fresh log accepts a genesis block");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Everything above the engine (networking, mempools, balances, terminal
//! rendering) lives with the caller; the crate exposes the operations and
//! reports progress through plain callbacks.

pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    basic_block_sanity, build_proof, compute_merkle_root, empty_merkle_root, leading_zero_bits,
    make_genesis_block, meets_difficulty, merkle_root, mine_block, verify_proof, Block,
    BlockHeader, Chain, ChainConfig, MerkleProof, MinerProgress, ProofStep, Transaction,
    ValidationError, ValidationResult,
};
pub use error::{ChainError, Result};
pub use storage::BlockStore;
pub use utils::{
    crypto_init, crypto_shutdown, current_timestamp, generate_default_keypair,
    generate_ec_keypair, hash160, hash_concat, sha256_digest, sign_message, to_hex,
    verify_message, Hash160, Hash256, KeyPair, DEFAULT_CURVE, ZERO_HASH,
};
