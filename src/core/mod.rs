//! Core chain engine
//!
//! This module contains the fundamental components: blocks, transactions,
//! the Merkle tree, chain validation, and proof-of-work mining.

pub mod block;
pub mod chain;
pub mod merkle;
pub mod miner;
pub mod proof_of_work;
pub mod transaction;

pub use block::{
    basic_block_sanity, compute_merkle_root, empty_merkle_root, make_genesis_block, Block,
    BlockHeader, HEADER_ENCODED_LEN,
};
pub use chain::{Chain, ChainConfig, ValidationError, ValidationResult};
pub use merkle::{build_proof, merkle_root, verify_proof, MerkleProof, ProofStep};
pub use miner::{mine_block, MinerProgress};
pub use proof_of_work::{leading_zero_bits, meets_difficulty};
pub use transaction::Transaction;
