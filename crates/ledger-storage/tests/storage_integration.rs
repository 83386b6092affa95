mod helpers;

use helpers::{create_temp_dir, create_temp_store, teardown_store};
use ledger_core::{Block, Blockchain, ChainStore, LedgerError};
use ledger_storage::SledStore;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

fn random_payload(rng: &mut impl Rng) -> String {
    (0..32).map(|_| rng.sample(Alphanumeric) as char).collect()
}

#[test]
fn test_empty_database() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    assert!(!store.exists()?);
    assert!(store.load_tip()?.is_none(), "Tip should be None for empty database");
    let err = store.load_block("missing").unwrap_err();
    assert!(matches!(err, LedgerError::BlockNotFound(ref h) if h == "missing"));
    teardown_store(temp_dir, store);
    Ok(())
}

#[test]
fn test_block_round_trip_by_hash() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let mut rng = rand::thread_rng();
    let mut blocks = Vec::new();
    let mut prev = String::new();
    for i in 0..50u64 {
        let block = Block::new(i, random_payload(&mut rng), prev.clone(), 1, "miner").mine();
        store.save_block(&block)?;
        prev = block.hash.clone();
        blocks.push(block);
    }
    for block in &blocks {
        assert_eq!(&store.load_block(&block.hash)?, block);
    }
    assert_eq!(store.block_count(), blocks.len());
    teardown_store(temp_dir, store);
    Ok(())
}

#[test]
fn test_tip_marks_chain_as_existing() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    store.save_tip("abc123")?;
    assert!(store.exists()?);
    assert_eq!(store.load_tip()?.as_deref(), Some("abc123"));
    store.save_tip("def456")?;
    assert_eq!(store.load_tip()?.as_deref(), Some("def456"));
    teardown_store(temp_dir, store);
    Ok(())
}

#[test]
fn test_chain_persists_across_reopen() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let tip;
    {
        let store = Arc::new(SledStore::open(&db_path)?);
        let mut chain = Blockchain::new(2, store.clone())?;
        chain.add_block("first", "miner")?;
        chain.add_block("second", "miner")?;
        tip = chain.tip().to_string();
        store.close()?;
    }
    {
        let store = Arc::new(SledStore::open(&db_path)?);
        let chain = Blockchain::new(2, store.clone())?;
        assert_eq!(chain.tip(), tip);
        assert_eq!(store.block_count(), 3);

        let indices = chain
            .iter()
            .map(|b| b.map(|b| b.index))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(indices, vec![2, 1, 0]);
    }
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_add_block_over_sled() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let store = Arc::new(SledStore::open(&db_path)?);
    let mut chain = Blockchain::new(3, store.clone())?;
    let genesis = chain.last_block()?;

    chain.add_block("Block Data", "miner_address")?;

    let block = store.load_block(chain.tip())?;
    assert_eq!(block.index, 1);
    assert_eq!(block.prev_hash, genesis.hash);
    assert!(block.hash.starts_with("000"));
    assert_eq!(store.block_count(), 2);
    drop(chain);
    drop(store);
    temp_dir.close()?;
    Ok(())
}

#[test]
fn test_corrupted_block_is_storage_failure() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let block = Block::new(0, "payload", "", 1, "").mine();
    {
        let store = SledStore::open(&db_path)?;
        store.save_block(&block)?;
        store.close()?;
    }
    {
        let sled_db = sled::open(&db_path)?;
        let blocks = sled_db.open_tree("blocks")?;
        blocks.insert(block.hash.as_bytes(), vec![0u8; 10])?;
        sled_db.flush()?;
    }
    let store = SledStore::open(&db_path)?;
    let err = store.load_block(&block.hash).unwrap_err();
    assert!(matches!(err, LedgerError::StorageFailure { ref key, .. } if key == &block.hash));
    drop(store);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_readers() -> anyhow::Result<()> {
    use tokio::task;

    let (temp_dir, db_path) = create_temp_dir();
    let store = Arc::new(SledStore::open(&db_path)?);
    let mut chain = Blockchain::new(1, store.clone())?;
    for i in 0..10 {
        chain.add_block(format!("block {i}"), "miner")?;
    }
    let tip = chain.tip().to_string();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let tip = tip.clone();
        handles.push(task::spawn_blocking(move || {
            ledger_core::ChainIterator::new(store, tip).count()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await?, 11);
    }
    drop(chain);
    drop(store);
    temp_dir.close()?;
    Ok(())
}
