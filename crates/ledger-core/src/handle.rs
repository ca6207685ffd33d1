use crate::block::{Block, Record};
use crate::chain::Chain;
use crate::error::Result;
use crate::submission::SubmissionWorkflow;
use crate::Hash;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle to a chain shared between tasks. Appends hold the write
/// lock for the whole sequence, so readers only ever see committed blocks.
#[derive(Clone)]
pub struct ChainHandle {
    inner: Arc<RwLock<Chain>>,
}

impl ChainHandle {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    pub fn height(&self) -> u64 {
        self.inner.read().height()
    }

    pub fn tip(&self) -> Option<Block> {
        self.inner.read().tip().cloned()
    }

    pub fn append(&self, candidate: Block) -> Result<Block> {
        self.inner.write().append(candidate).cloned()
    }

    pub fn submit(
        &self,
        workflow: &SubmissionWorkflow,
        address: &str,
        message: &str,
        signature: &str,
        data: serde_json::Value,
    ) -> Result<Block> {
        let mut chain = self.inner.write();
        workflow.submit(&mut chain, address, message, signature, data)
    }

    pub fn validate(&self) -> Vec<String> {
        self.inner.read().validate_chain()
    }

    pub fn get_by_position(&self, position: u64) -> Option<Block> {
        self.inner.read().get_by_position(position).cloned()
    }

    pub fn get_by_fingerprint(&self, fingerprint: &Hash) -> Result<Option<Block>> {
        Ok(self.inner.read().get_by_fingerprint(fingerprint)?.cloned())
    }

    pub fn get_by_owner(&self, address: &str) -> Result<Vec<Record>> {
        self.inner.read().get_by_owner(address)
    }

    pub fn blocks_range(&self, from: u64, limit: u32) -> Vec<Block> {
        self.inner.read().blocks_range(from, limit).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::hasher::Sha256Hasher;
    use crate::verifier::{address_of, sign_challenge, Ed25519Verifier};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use serde_json::json;
    use std::thread;

    #[test]
    fn concurrent_appends_are_serialized() {
        let handle = ChainHandle::new(Chain::new());
        let workers: Vec<_> = (0..8)
            .map(|w| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for n in 0..25u64 {
                        let record = Record::new(format!("worker{w}"), json!(n));
                        handle.append(Block::from_record(&record).unwrap()).unwrap();
                    }
                })
            })
            .collect();
        let reader = {
            let handle = handle.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    if let Some(tip) = handle.tip() {
                        assert!(tip.fingerprint.is_some());
                    }
                }
            })
        };
        for w in workers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(handle.height(), 200);
        assert!(handle.validate().is_empty());
        assert_eq!(handle.get_by_owner("worker3").unwrap().len(), 25);
    }

    #[test]
    fn submit_through_handle() {
        let clock = Arc::new(FixedClock::new(1_700_000_000));
        let handle = ChainHandle::new(Chain::in_memory(Arc::new(Sha256Hasher), clock.clone()));
        let workflow = SubmissionWorkflow::new(Arc::new(Ed25519Verifier), clock);
        let key = SigningKey::generate(&mut OsRng);
        let address = address_of(&key.verifying_key());

        let message = workflow.issue_challenge(&address);
        let sig = sign_challenge(&key, &message);
        let block = handle
            .submit(&workflow, &address, &message, &sig, json!({ "title": "lot 4" }))
            .unwrap();

        let fp = block.fingerprint.unwrap();
        assert_eq!(handle.get_by_fingerprint(&fp).unwrap(), Some(block.clone()));
        assert_eq!(handle.get_by_position(1), Some(block));
        assert_eq!(handle.blocks_range(0, 10).len(), 2);
    }
}
