//! Persistence scenarios: append-and-store followed by restore into a
//! fresh chain, recovery from invalid tails, and the clear-and-reopen flow.

use astral_chain::{
    crypto_init, generate_default_keypair, make_genesis_block, BlockStore, Chain, ChainConfig,
    Transaction, ValidationError, GLOBAL_CONFIG,
};
use tempfile::tempdir;

fn signed_tx(nonce: u64, amount: u64) -> Transaction {
    crypto_init().unwrap();
    let kp = generate_default_keypair().unwrap();
    let mut tx = Transaction {
        nonce,
        amount,
        from_pub_pem: kp.pubkey_pem,
        to_label: "x".to_string(),
        ..Default::default()
    };
    tx.sign(&kp.privkey_pem).unwrap();
    tx
}

#[test]
fn persisted_chain_restores_with_the_same_tip() {
    let dir = tempdir().unwrap();
    let mut store = BlockStore::open(dir.path().join("chain")).unwrap();

    let mut chain = Chain::new(ChainConfig::default());
    chain
        .append_and_store(make_genesis_block("g", 1_700_000_000), &mut store)
        .unwrap();
    let block = chain.build_block_from_transactions(vec![signed_tx(1, 7)], 1_700_000_001);
    chain.append_and_store(block, &mut store).unwrap();

    let mut restored = Chain::new(ChainConfig::default());
    let count = restored.restore_from_store(&store).unwrap();

    assert_eq!(count, 2);
    assert_eq!(restored.height(), 2);
    assert_eq!(restored.tip_hash(), chain.tip_hash());

    // The restored blocks are byte-identical to the originals.
    for (original, recovered) in chain.blocks().iter().zip(restored.blocks()) {
        assert_eq!(original.serialize(), recovered.serialize());
    }
}

#[test]
fn restore_stops_at_the_first_invalid_block() {
    let dir = tempdir().unwrap();
    let mut store = BlockStore::open(dir.path().join("chain")).unwrap();

    let mut chain = Chain::new(ChainConfig::default());
    chain
        .append_and_store(make_genesis_block("g", 1_700_000_000), &mut store)
        .unwrap();
    let block = chain.build_block_from_transactions(vec![signed_tx(1, 7)], 1_700_000_001);
    chain.append_and_store(block, &mut store).unwrap();

    // A stray record that does not link to the tip, written behind the
    // chain's back. It frames and checksums correctly, so only validation
    // can reject it.
    store
        .append_block(&make_genesis_block("stray", 1_700_000_002))
        .unwrap();
    let tail = chain.build_block_from_transactions(vec![signed_tx(2, 9)], 1_700_000_003);
    store.append_block(&tail).unwrap();

    let mut restored = Chain::new(ChainConfig::default());
    let count = restored.restore_from_store(&store).unwrap();

    // Restoration keeps the valid prefix and quietly drops the rest.
    assert_eq!(count, 2);
    assert_eq!(restored.height(), 2);
    assert_eq!(restored.tip_hash(), chain.tip_hash());
}

#[test]
fn rejected_blocks_are_never_persisted() {
    let dir = tempdir().unwrap();
    let mut store = BlockStore::open(dir.path().join("chain")).unwrap();

    let mut chain = Chain::new(ChainConfig::default());
    chain
        .append_and_store(make_genesis_block("g", 1_700_000_000), &mut store)
        .unwrap();

    let mut bad = chain.build_block_from_transactions(vec![signed_tx(1, 7)], 1_700_000_001);
    bad.header.prev_hash = [0u8; 32];
    assert_eq!(
        chain.append_and_store(bad, &mut store),
        Err(ValidationError::BadPrevLink)
    );

    assert_eq!(chain.height(), 1);
    assert_eq!(store.load_all_blocks().unwrap().len(), 1);
}

#[test]
fn cleared_store_restores_to_an_empty_chain() {
    let dir = tempdir().unwrap();
    let mut store = BlockStore::open(dir.path().join("chain")).unwrap();

    let mut chain = Chain::new(ChainConfig::default());
    chain
        .append_and_store(make_genesis_block("g", 1_700_000_000), &mut store)
        .unwrap();

    store.clear().unwrap();

    let mut restored = Chain::new(ChainConfig::default());
    assert_eq!(restored.restore_from_store(&store).unwrap(), 0);
    assert_eq!(restored.height(), 0);
    assert!(restored.tip_hash().is_none());

    // The cleared log accepts a fresh history.
    restored
        .append_and_store(make_genesis_block("fresh", 1_700_000_010), &mut store)
        .unwrap();
    assert_eq!(store.load_all_blocks().unwrap().len(), 1);
}

#[test]
fn open_default_uses_the_configured_data_dir() {
    let dir = tempdir().unwrap();
    GLOBAL_CONFIG.set_data_dir(dir.path().join("chain").to_string_lossy().into_owned());

    let store = BlockStore::open_default().unwrap();
    assert!(store.log_path().starts_with(dir.path()));
}

#[test]
fn reopened_store_appends_after_existing_records() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("chain");

    {
        let mut store = BlockStore::open(&root).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        chain
            .append_and_store(make_genesis_block("g", 1_700_000_000), &mut store)
            .unwrap();
    }

    // A second session opens the same directory and keeps extending.
    let mut store = BlockStore::open(&root).unwrap();
    let mut chain = Chain::new(ChainConfig::default());
    chain.restore_from_store(&store).unwrap();
    assert_eq!(chain.height(), 1);

    let block = chain.build_block_from_transactions(vec![signed_tx(1, 3)], 1_700_000_001);
    chain.append_and_store(block, &mut store).unwrap();

    let mut verifier = Chain::new(ChainConfig::default());
    verifier.restore_from_store(&store).unwrap();
    assert_eq!(verifier.height(), 2);
    assert_eq!(verifier.tip_hash(), chain.tip_hash());
}
