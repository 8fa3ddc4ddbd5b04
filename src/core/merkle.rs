//! Merkle tree over 32-byte leaf digests.
//!
//! The root is built by pairing adjacent leaves left-to-right and hashing
//! each pair with [`hash_concat`]; an odd level duplicates its last element.
//! An empty leaf set hashes to `sha256("")`, and a single leaf `L` to
//! `sha256(L || L)`.

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};
use crate::utils::{hash_concat, sha256_digest, Hash256};

/// One level of an inclusion proof: the sibling digest and its side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Hash256,
    /// True when the sibling sits to the left of the running hash.
    pub sibling_on_left: bool,
}

/// Inclusion proof for a single leaf, ordered leaf level first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerkleProof {
    pub steps: Vec<ProofStep>,
}

/// Computes the Merkle root of the leaf set.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return sha256_digest(&[]);
    }
    if leaves.len() == 1 {
        return hash_concat(&leaves[0], &leaves[0]);
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = collapse_level(&level);
    }
    level[0]
}

/// Builds an inclusion proof for the leaf at `index`.
pub fn build_proof(leaves: &[Hash256], index: usize) -> Result<MerkleProof> {
    if index >= leaves.len() {
        return Err(ChainError::Invalid(format!(
            "merkle proof index {index} out of range for {} leaves",
            leaves.len()
        )));
    }

    let mut proof = MerkleProof::default();
    let mut level = leaves.to_vec();
    let mut position = index;

    while level.len() > 1 {
        let last = level.len() - 1;
        let sibling_on_left = position % 2 == 1;
        let sibling_index = if sibling_on_left {
            position - 1
        } else if position + 1 <= last {
            position + 1
        } else {
            // Odd tail: the element is its own sibling.
            position
        };

        proof.steps.push(ProofStep {
            sibling: level[sibling_index],
            sibling_on_left,
        });

        position /= 2;
        level = collapse_level(&level);
    }

    Ok(proof)
}

/// Replays a proof from `leaf_hash` and compares against `expected_root`.
pub fn verify_proof(leaf_hash: &Hash256, proof: &MerkleProof, expected_root: &Hash256) -> bool {
    if proof.steps.is_empty() {
        // Single-leaf tree: reconstruct sha256(leaf || leaf) independently.
        return hash_concat(leaf_hash, leaf_hash) == *expected_root;
    }

    let mut current = *leaf_hash;
    for step in &proof.steps {
        current = if step.sibling_on_left {
            hash_concat(&step.sibling, &current)
        } else {
            hash_concat(&current, &step.sibling)
        };
    }
    current == *expected_root
}

fn collapse_level(level: &[Hash256]) -> Vec<Hash256> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for pair in level.chunks(2) {
        let left = &pair[0];
        let right = pair.get(1).unwrap_or(left);
        next.push(hash_concat(left, right));
    }
    next
}
