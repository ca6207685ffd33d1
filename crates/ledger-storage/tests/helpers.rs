#![allow(dead_code)]

use std::fs;
use std::sync::Arc;

use ledger_core::{Block, Chain, FixedClock, Record, Sha256Hasher};
use ledger_storage::SledStore;
use serde_json::json;
use tempfile::{tempdir, TempDir};

pub const T0: u64 = 1_700_000_000;

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn open_chain(store: &SledStore, clock: &Arc<FixedClock>) -> ledger_core::Result<Chain> {
    Chain::open(
        Arc::new(store.clone()),
        Arc::new(Sha256Hasher),
        clock.clone(),
    )
}

pub fn record_block(owner: &str, n: u64) -> Block {
    Block::from_record(&Record::new(owner, json!({ "n": n }))).expect("record encodes")
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    // Verify the directory is removed
    assert!(!db_path.exists(), "Database directory should be removed");
}
