//! Blocks, headers, and their canonical encoding.

use serde::{Deserialize, Serialize};

use crate::core::merkle;
use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{sha256_digest, ByteReader, ByteWriter, Hash256, ZERO_HASH};

/// Serialized header size: u32 version, two raw 32-byte hashes, u64
/// timestamp, u64 nonce.
pub const HEADER_ENCODED_LEN: usize = 84;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    /// Header hash of the parent block; all zeros for genesis.
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    /// Seconds since the Unix epoch, caller-supplied.
    pub timestamp: u64,
    pub nonce: u64,
}

impl Default for BlockHeader {
    fn default() -> Self {
        BlockHeader {
            version: 1,
            prev_hash: ZERO_HASH,
            merkle_root: ZERO_HASH,
            timestamp: 0,
            nonce: 0,
        }
    }
}

impl BlockHeader {
    /// Canonical 84-byte encoding. The hashes are written raw, with no
    /// length prefix.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_u32(self.version);
        writer.write_raw(&self.prev_hash);
        writer.write_raw(&self.merkle_root);
        writer.write_u64(self.timestamp);
        writer.write_u64(self.nonce);
        writer.take()
    }

    /// SHA-256 over the canonical header encoding.
    pub fn hash(&self) -> Hash256 {
        sha256_digest(&self.serialize())
    }
}

/// A header plus its ordered transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Canonical encoding: raw header bytes, u32 transaction count, then a
    /// u32 byte length plus full encoding per transaction.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_raw(&self.header.serialize());
        writer.write_u32(self.transactions.len() as u32);
        for tx in &self.transactions {
            writer.write_bytes(&tx.serialize());
        }
        writer.take()
    }

    /// Inverse of [`Block::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        let mut reader = ByteReader::new(bytes);

        let version = reader.read_u32()?;
        let prev_hash = read_hash256(&mut reader)?;
        let merkle_root = read_hash256(&mut reader)?;
        let timestamp = reader.read_u64()?;
        let nonce = reader.read_u64()?;

        let tx_count = reader.read_u32()?;
        let mut transactions = Vec::new();
        for _ in 0..tx_count {
            let tx_bytes = reader.read_bytes()?;
            transactions.push(Transaction::deserialize(&tx_bytes)?);
        }

        Ok(Block {
            header: BlockHeader {
                version,
                prev_hash,
                merkle_root,
                timestamp,
                nonce,
            },
            transactions,
        })
    }
}

fn read_hash256(reader: &mut ByteReader<'_>) -> Result<Hash256> {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(reader.read_raw(32)?);
    Ok(hash)
}

/// Merkle root over the transactions' hashes.
pub fn compute_merkle_root(transactions: &[Transaction]) -> Hash256 {
    let leaves: Vec<Hash256> = transactions.iter().map(Transaction::tx_hash).collect();
    merkle::merkle_root(&leaves)
}

/// Root of the empty transaction set.
pub fn empty_merkle_root() -> Hash256 {
    sha256_digest(&[])
}

/// Builds the genesis candidate: a single coinbase carrying `note` as its
/// recipient label, under a version-1 header with zero parent and nonce 0.
pub fn make_genesis_block(note: &str, unix_time: u64) -> Block {
    let coinbase = Transaction {
        to_label: note.to_string(),
        ..Default::default()
    };
    let transactions = vec![coinbase];

    let header = BlockHeader {
        version: 1,
        prev_hash: ZERO_HASH,
        merkle_root: compute_merkle_root(&transactions),
        timestamp: unix_time,
        nonce: 0,
    };

    Block {
        header,
        transactions,
    }
}

/// Structural checks that do not need chain context: the header Merkle
/// root must match the transactions, and a genesis block must have a zero
/// parent hash.
pub fn basic_block_sanity(block: &Block, is_genesis: bool) -> bool {
    if block.header.merkle_root != compute_merkle_root(&block.transactions) {
        return false;
    }
    if is_genesis && block.header.prev_hash != ZERO_HASH {
        return false;
    }
    true
}
