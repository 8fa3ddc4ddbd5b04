//! Chain state, block validation, and the append pipelines.

use log::{info, warn};
use std::fmt;

use crate::core::block::{compute_merkle_root, Block, BlockHeader};
use crate::core::proof_of_work::meets_difficulty;
use crate::core::Transaction;
use crate::error::Result;
use crate::storage::BlockStore;
use crate::utils::{to_hex, Hash256, ZERO_HASH};

/// Chain-wide validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainConfig {
    /// Minimum leading-zero bits of a header hash; 0 disables the check.
    pub difficulty_bits: u32,
    /// Whether the genesis block must also meet difficulty.
    pub enforce_genesis_pow: bool,
}

/// Why a candidate block was rejected. Variants carry the index of the
/// offending transaction where the failure identifies one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyChainButNotGenesis,
    NonZeroPrevHashForGenesis,
    BadPrevLink,
    NonMonotonicTimestamp,
    BadMerkleRoot,
    BadTransactionSignature(usize),
    CoinbaseMisplaced(usize),
    CoinbaseInNonGenesisBlock(usize),
    InsufficientPow,
    /// The store rejected the block; the in-memory chain was left unchanged.
    Persistence(String),
}

impl ValidationError {
    /// Index of the offending transaction, where one is identified.
    pub fn tx_index(&self) -> Option<usize> {
        match self {
            ValidationError::BadTransactionSignature(i)
            | ValidationError::CoinbaseMisplaced(i)
            | ValidationError::CoinbaseInNonGenesisBlock(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyChainButNotGenesis => {
                write!(f, "chain is empty but block is not a genesis candidate")
            }
            ValidationError::NonZeroPrevHashForGenesis => {
                write!(f, "genesis block has a non-zero previous hash")
            }
            ValidationError::BadPrevLink => write!(f, "previous hash does not match the tip"),
            ValidationError::NonMonotonicTimestamp => {
                write!(f, "timestamp is older than the tip's")
            }
            ValidationError::BadMerkleRoot => {
                write!(f, "merkle root does not match the transactions")
            }
            ValidationError::BadTransactionSignature(i) => {
                write!(f, "invalid signature on transaction {i}")
            }
            ValidationError::CoinbaseMisplaced(i) => {
                write!(f, "misplaced coinbase at transaction {i}")
            }
            ValidationError::CoinbaseInNonGenesisBlock(i) => {
                write!(f, "coinbase at transaction {i} outside the genesis block")
            }
            ValidationError::InsufficientPow => {
                write!(f, "header hash does not meet the difficulty target")
            }
            ValidationError::Persistence(msg) => write!(f, "persistence failed: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of validating or appending a block. Validation never panics or
/// propagates engine errors; everything is reported through this value.
pub type ValidationResult = std::result::Result<(), ValidationError>;

/// In-memory ordered sequence of cryptographically linked blocks.
///
/// The chain grows only through successful appends; existing entries are
/// never mutated or removed. Mutating operations must be serialized by the
/// caller.
pub struct Chain {
    config: ChainConfig,
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Chain {
        Chain {
            config,
            blocks: Vec::new(),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn set_difficulty_bits(&mut self, bits: u32) {
        self.config.difficulty_bits = bits;
    }

    pub fn height(&self) -> usize {
        self.blocks.len()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Header hash of the tip, or `None` for an empty chain.
    pub fn tip_hash(&self) -> Option<Hash256> {
        self.blocks.last().map(|block| block.header.hash())
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Applies the validation rules to a candidate block, in order: linkage
    /// and coinbase placement, Merkle root, transaction signatures, then
    /// proof-of-work.
    pub fn validate_block(&self, block: &Block) -> ValidationResult {
        let is_genesis_candidate = match self.blocks.last() {
            None => {
                if block.header.prev_hash != ZERO_HASH {
                    return Err(ValidationError::NonZeroPrevHashForGenesis);
                }
                if let Some(first) = block.transactions.first() {
                    if !first.from_pub_pem.is_empty() {
                        return Err(ValidationError::CoinbaseMisplaced(0));
                    }
                    for (i, tx) in block.transactions.iter().enumerate().skip(1) {
                        if tx.from_pub_pem.is_empty() {
                            return Err(ValidationError::CoinbaseMisplaced(i));
                        }
                    }
                }
                true
            }
            Some(tip) => {
                if block.header.prev_hash != tip.header.hash() {
                    return Err(ValidationError::BadPrevLink);
                }
                if block.header.timestamp < tip.header.timestamp {
                    return Err(ValidationError::NonMonotonicTimestamp);
                }
                for (i, tx) in block.transactions.iter().enumerate() {
                    if tx.from_pub_pem.is_empty() {
                        return Err(ValidationError::CoinbaseInNonGenesisBlock(i));
                    }
                }
                false
            }
        };

        if compute_merkle_root(&block.transactions) != block.header.merkle_root {
            return Err(ValidationError::BadMerkleRoot);
        }

        for (i, tx) in block.transactions.iter().enumerate() {
            // The permitted genesis coinbase has nothing to verify.
            if is_genesis_candidate && i == 0 && tx.from_pub_pem.is_empty() {
                continue;
            }
            if !tx.verify() {
                return Err(ValidationError::BadTransactionSignature(i));
            }
        }

        if self.config.difficulty_bits > 0
            && (!is_genesis_candidate || self.config.enforce_genesis_pow)
            && !meets_difficulty(self.config.difficulty_bits, &block.header.hash())
        {
            return Err(ValidationError::InsufficientPow);
        }

        Ok(())
    }

    /// Validates, then appends to the in-memory sequence.
    pub fn append_block(&mut self, block: Block) -> ValidationResult {
        self.validate_block(&block)?;
        let hash_hex = to_hex(&block.header.hash());
        self.blocks.push(block);
        info!(
            "appended block at height {} ({}…)",
            self.blocks.len(),
            &hash_hex[..16]
        );
        Ok(())
    }

    /// Validates, persists to the store, then appends to memory. The store
    /// write completes its durability barrier before the in-memory state
    /// changes, so a restore can never see a block this chain did not
    /// acknowledge. A store failure leaves the chain untouched.
    pub fn append_and_store(&mut self, block: Block, store: &mut BlockStore) -> ValidationResult {
        self.validate_block(&block)?;
        if let Err(err) = store.append_block(&block) {
            return Err(ValidationError::Persistence(err.to_string()));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Re-appends the store's block sequence in on-disk order, stopping
    /// quietly at the first block that fails validation. A torn tail on
    /// disk therefore recovers as a clean truncation, not an error. Only an
    /// unreadable log fails.
    ///
    /// Returns the number of blocks restored.
    pub fn restore_from_store(&mut self, store: &BlockStore) -> Result<usize> {
        let stored = store.load_all_blocks()?;
        let mut restored = 0;
        for block in stored {
            if let Err(err) = self.append_block(block) {
                warn!("stopping restore at height {}: {err}", self.blocks.len());
                break;
            }
            restored += 1;
        }
        info!(
            "restored {restored} blocks from {}",
            store.log_path().display()
        );
        Ok(restored)
    }

    /// Builds an unvalidated candidate on top of the current tip: version 1,
    /// nonce 0, Merkle root computed from the transactions. Callers append
    /// it through the validator.
    pub fn build_block_from_transactions(
        &self,
        transactions: Vec<Transaction>,
        timestamp: u64,
    ) -> Block {
        let header = BlockHeader {
            version: 1,
            prev_hash: self.tip_hash().unwrap_or(ZERO_HASH),
            merkle_root: compute_merkle_root(&transactions),
            timestamp,
            nonce: 0,
        };
        Block {
            header,
            transactions,
        }
    }
}
