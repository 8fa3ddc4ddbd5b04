//! Transfer authorizations and their canonical encoding.

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};
use crate::utils::{sha256_digest, sign_message, verify_message, ByteReader, ByteWriter, Hash256};

const TX_MAGIC: [u8; 2] = [0xA1, 0x01];
const TX_SCHEMA: u32 = 1;

/// A transfer authorization.
///
/// A transaction with an empty `from_pub_pem` is a *coinbase*; it carries
/// an empty signature and is only legal at index 0 of the genesis block.
/// Transactions are signed once and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u16,
    /// Caller-assigned; not validated globally.
    pub nonce: u64,
    pub amount: u64,
    /// PEM public key of the sender; empty for a coinbase.
    pub from_pub_pem: Vec<u8>,
    /// Human-readable recipient label, opaque to the engine.
    pub to_label: String,
    /// DER signature over the signing preimage; empty until signed.
    pub signature: Vec<u8>,
}

impl Default for Transaction {
    fn default() -> Self {
        Transaction {
            version: 1,
            nonce: 0,
            amount: 0,
            from_pub_pem: Vec::new(),
            to_label: String::new(),
            signature: Vec::new(),
        }
    }
}

impl Transaction {
    /// Full canonical encoding, signature included.
    pub fn serialize(&self) -> Vec<u8> {
        self.encode(true)
    }

    /// The signing preimage: the full encoding with the trailing signature
    /// field replaced by a u32 zero. Stable across signing.
    pub fn signing_preimage(&self) -> Vec<u8> {
        self.encode(false)
    }

    fn encode(&self, with_signature: bool) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_u8(TX_MAGIC[0]);
        writer.write_u8(TX_MAGIC[1]);
        writer.write_u32(TX_SCHEMA);
        writer.write_u32(u32::from(self.version));
        writer.write_u64(self.nonce);
        writer.write_u64(self.amount);
        writer.write_bytes(&self.from_pub_pem);
        writer.write_string(&self.to_label);
        if with_signature {
            writer.write_bytes(&self.signature);
        } else {
            writer.write_u32(0);
        }
        writer.take()
    }

    /// Decodes the full canonical encoding. Trusts its own encoder; bad
    /// magic or schema values are rejected as `Invalid`.
    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        let mut reader = ByteReader::new(bytes);

        let magic = [reader.read_u8()?, reader.read_u8()?];
        if magic != TX_MAGIC {
            return Err(ChainError::Invalid(format!(
                "bad transaction magic {:02x}{:02x}",
                magic[0], magic[1]
            )));
        }
        let schema = reader.read_u32()?;
        if schema != TX_SCHEMA {
            return Err(ChainError::Invalid(format!(
                "unsupported transaction schema {schema}"
            )));
        }

        Ok(Transaction {
            version: reader.read_u32()? as u16,
            nonce: reader.read_u64()?,
            amount: reader.read_u64()?,
            from_pub_pem: reader.read_bytes()?,
            to_label: reader.read_string()?,
            signature: reader.read_bytes()?,
        })
    }

    /// SHA-256 of the signing preimage, so the hash is the same before and
    /// after signing.
    pub fn tx_hash(&self) -> Hash256 {
        sha256_digest(&self.signing_preimage())
    }

    /// Signs the transaction, setting its signature field.
    pub fn sign(&mut self, privkey_pem: &[u8]) -> Result<()> {
        let preimage = self.signing_preimage();
        self.signature = sign_message(privkey_pem, &preimage)?;
        Ok(())
    }

    /// Checks the signature against the sender public key. Returns `false`
    /// when the sender key is absent.
    pub fn verify(&self) -> bool {
        if self.from_pub_pem.is_empty() {
            return false;
        }
        verify_message(&self.from_pub_pem, &self.signing_preimage(), &self.signature)
    }

    pub fn is_coinbase(&self) -> bool {
        self.from_pub_pem.is_empty()
    }
}
