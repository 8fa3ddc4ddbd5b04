//! End-to-end chain scenarios: genesis acceptance, link and Merkle
//! tampering, coinbase placement, and mining against a real difficulty.

use std::sync::atomic::AtomicBool;

use astral_chain::{
    compute_merkle_root, crypto_init, generate_default_keypair, leading_zero_bits,
    make_genesis_block, mine_block, Chain, ChainConfig, Transaction, ValidationError, ZERO_HASH,
};

fn signed_tx(nonce: u64, amount: u64) -> Transaction {
    crypto_init().unwrap();
    let kp = generate_default_keypair().unwrap();
    let mut tx = Transaction {
        nonce,
        amount,
        from_pub_pem: kp.pubkey_pem,
        to_label: "darth vader".to_string(),
        ..Default::default()
    };
    tx.sign(&kp.privkey_pem).unwrap();
    tx
}

fn chain_with_genesis() -> Chain {
    let mut chain = Chain::new(ChainConfig {
        difficulty_bits: 0,
        enforce_genesis_pow: false,
    });
    chain
        .append_block(make_genesis_block("g", 1_700_000_000))
        .unwrap();
    chain
}

#[test]
fn genesis_is_accepted_on_an_empty_chain() {
    let mut chain = Chain::new(ChainConfig::default());
    assert!(chain
        .append_block(make_genesis_block("g", 1_700_000_000))
        .is_ok());
    assert_eq!(chain.height(), 1);
    assert!(chain.tip_hash().is_some());
}

#[test]
fn block_with_broken_prev_link_is_rejected() {
    let mut chain = chain_with_genesis();

    let mut block = chain.build_block_from_transactions(vec![signed_tx(1, 10)], 1_700_000_001);
    block.header.prev_hash = ZERO_HASH;

    assert_eq!(chain.append_block(block), Err(ValidationError::BadPrevLink));
    assert_eq!(chain.height(), 1);
}

#[test]
fn merkle_and_signature_tampering_are_told_apart() {
    let mut chain = chain_with_genesis();

    let good = chain.build_block_from_transactions(vec![signed_tx(1, 10)], 1_700_000_001);

    let mut bad_merkle = good.clone();
    bad_merkle.header.merkle_root = ZERO_HASH;
    assert_eq!(
        chain.append_block(bad_merkle),
        Err(ValidationError::BadMerkleRoot)
    );

    // The signature is outside the signing preimage, so the Merkle root
    // stays valid and the failure lands on the signature check.
    let mut bad_signature = good.clone();
    bad_signature.transactions[0].signature[5] ^= 0x01;
    let err = chain.append_block(bad_signature).unwrap_err();
    assert_eq!(err, ValidationError::BadTransactionSignature(0));
    assert_eq!(err.tx_index(), Some(0));

    // The untampered block still goes through.
    assert!(chain.append_block(good).is_ok());
    assert_eq!(chain.height(), 2);
}

#[test]
fn coinbase_after_genesis_is_rejected() {
    let mut chain = chain_with_genesis();

    let coinbase = Transaction {
        to_label: "late coinbase".to_string(),
        ..Default::default()
    };
    let block = chain.build_block_from_transactions(vec![coinbase], 1_700_000_001);

    assert_eq!(
        chain.append_block(block),
        Err(ValidationError::CoinbaseInNonGenesisBlock(0))
    );
}

#[test]
fn mined_block_meets_difficulty_and_appends() {
    let mut chain = chain_with_genesis();
    let cancel = AtomicBool::new(false);

    let mined = mine_block(&chain, vec![signed_tx(1, 42)], 12, &cancel, None, 10_000).unwrap();

    chain.set_difficulty_bits(12);
    assert!(chain.append_block(mined).is_ok());
    assert_eq!(chain.height(), 2);

    let tip_hash = chain.tip_hash().unwrap();
    assert!(leading_zero_bits(&tip_hash) >= 12);
}

#[test]
fn undermined_block_fails_the_difficulty_check() {
    let mut chain = chain_with_genesis();
    chain.set_difficulty_bits(255);

    let block = chain.build_block_from_transactions(vec![signed_tx(1, 1)], 1_700_000_001);
    assert_eq!(
        chain.append_block(block),
        Err(ValidationError::InsufficientPow)
    );
}

#[test]
fn genesis_pow_is_only_checked_when_enforced() {
    let mut lenient = Chain::new(ChainConfig {
        difficulty_bits: 255,
        enforce_genesis_pow: false,
    });
    assert!(lenient
        .append_block(make_genesis_block("g", 1_700_000_000))
        .is_ok());

    let mut strict = Chain::new(ChainConfig {
        difficulty_bits: 255,
        enforce_genesis_pow: true,
    });
    assert_eq!(
        strict.append_block(make_genesis_block("g", 1_700_000_000)),
        Err(ValidationError::InsufficientPow)
    );
}

#[test]
fn accepted_blocks_uphold_the_chain_invariants() {
    let mut chain = chain_with_genesis();
    for i in 1..5u64 {
        let block = chain
            .build_block_from_transactions(vec![signed_tx(i, i * 10)], 1_700_000_000 + i);
        chain.append_block(block).unwrap();
    }
    assert_eq!(chain.height(), 5);

    let blocks = chain.blocks();
    for i in 1..blocks.len() {
        assert_eq!(
            blocks[i].header.prev_hash,
            blocks[i - 1].header.hash(),
            "prev link broken at height {i}"
        );
        assert!(blocks[i].header.timestamp >= blocks[i - 1].header.timestamp);
    }
    for block in blocks {
        assert_eq!(
            compute_merkle_root(&block.transactions),
            block.header.merkle_root
        );
    }
    // Every transaction after the genesis coinbase verifies.
    for block in &blocks[1..] {
        for tx in &block.transactions {
            assert!(tx.verify());
        }
    }
}
