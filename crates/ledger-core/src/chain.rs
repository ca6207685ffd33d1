use crate::block::{Block, Record};
use crate::clock::{Clock, SystemClock};
use crate::constants::MAX_BLOCKS_PER_REQUEST;
use crate::error::{LedgerError, Result};
use crate::hasher::{Hasher, Sha256Hasher};
use crate::Hash;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistence seam the chain writes through. Implementations must hand blocks
/// back from `load_all` in position order.
pub trait ChainStore: Send + Sync {
    fn load_all(&self) -> anyhow::Result<Vec<Block>>;
    fn append_one(&self, block: &Block) -> anyhow::Result<()>;
}

/// Ordered, hash-linked sequence of blocks. Every append revalidates the
/// prospective chain and commits only if it is intact.
pub struct Chain {
    blocks: Vec<Block>,
    store: Option<Arc<dyn ChainStore>>,
    hasher: Arc<dyn Hasher>,
    clock: Arc<dyn Clock>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// In-memory chain with SHA-256 fingerprints and wall-clock timestamps.
    pub fn new() -> Self {
        Self::in_memory(Arc::new(Sha256Hasher), Arc::new(SystemClock))
    }

    pub fn in_memory(hasher: Arc<dyn Hasher>, clock: Arc<dyn Clock>) -> Self {
        let mut chain = Self {
            blocks: Vec::new(),
            store: None,
            hasher,
            clock,
        };
        let mut genesis = Block::genesis();
        chain.seal(&mut genesis);
        info!("genesis block created");
        chain.blocks.push(genesis);
        chain
    }

    /// Loads the chain from `store`, creating and persisting genesis when the
    /// store is empty. A stored chain that fails validation is refused.
    pub fn open(
        store: Arc<dyn ChainStore>,
        hasher: Arc<dyn Hasher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let blocks = store.load_all()?;
        let mut chain = Self {
            blocks,
            store: Some(store),
            hasher,
            clock,
        };
        if chain.blocks.is_empty() {
            chain.append(Block::genesis())?;
            info!("genesis block created");
        } else {
            let errors = chain.validate_chain();
            if !errors.is_empty() {
                return Err(LedgerError::ChainIntegrity(errors));
            }
            info!(height = chain.height(), "chain loaded");
        }
        Ok(chain)
    }

    /// Zero right after genesis.
    pub fn height(&self) -> u64 {
        self.blocks.len().saturating_sub(1) as u64
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn hasher(&self) -> &dyn Hasher {
        self.hasher.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut_for_test(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    fn seal(&self, candidate: &mut Block) {
        candidate.position = self.blocks.len() as u64;
        candidate.timestamp = self.clock.now_secs();
        candidate.previous_fingerprint = self.blocks.last().and_then(|b| b.fingerprint);
        candidate.fingerprint = Some(candidate.recompute_fingerprint(self.hasher.as_ref()));
    }

    /// Assigns position, timestamp and linkage, fingerprints the candidate and
    /// commits it only if the whole prospective chain validates and the store
    /// accepts it. On any failure the chain is left exactly as it was.
    pub fn append(&mut self, mut candidate: Block) -> Result<&Block> {
        self.seal(&mut candidate);
        self.blocks.push(candidate);

        let errors = self.validate_chain();
        if !errors.is_empty() {
            self.blocks.pop();
            warn!(errors = errors.len(), "append rejected");
            return Err(LedgerError::ChainIntegrity(errors));
        }

        if let Some(store) = &self.store {
            let persisted = store.append_one(&self.blocks[self.blocks.len() - 1]);
            if let Err(e) = persisted {
                self.blocks.pop();
                warn!("append rejected by store: {e:#}");
                return Err(LedgerError::Storage(e));
            }
        }

        let committed = &self.blocks[self.blocks.len() - 1];
        info!(
            position = committed.position,
            fingerprint = %committed.fingerprint_hex().unwrap_or_default(),
            "block committed"
        );
        Ok(committed)
    }

    /// Every defect in the chain; empty means valid.
    pub fn validate_chain(&self) -> Vec<String> {
        let errors = validate_blocks(&self.blocks, self.hasher.as_ref());
        debug!(blocks = self.blocks.len(), errors = errors.len(), "chain validated");
        errors
    }

    pub fn get_by_position(&self, position: u64) -> Option<&Block> {
        usize::try_from(position)
            .ok()
            .and_then(|i| self.blocks.get(i))
    }

    /// More than one match is an integrity fault, not a lookup result.
    pub fn get_by_fingerprint(&self, fingerprint: &Hash) -> Result<Option<&Block>> {
        let mut matches = self
            .blocks
            .iter()
            .filter(|b| b.fingerprint.as_ref() == Some(fingerprint));
        let first = matches.next();
        let collisions: Vec<u64> = matches.map(|b| b.position).collect();
        if let (Some(first), false) = (first, collisions.is_empty()) {
            return Err(LedgerError::ChainIntegrity(
                collisions
                    .into_iter()
                    .map(|p| {
                        format!(
                            "block {p}: fingerprint {} collides with block {}",
                            hex::encode(fingerprint),
                            first.position
                        )
                    })
                    .collect(),
            ));
        }
        Ok(first)
    }

    /// Records owned by `address` in position order. No match is an empty list.
    pub fn get_by_owner(&self, address: &str) -> Result<Vec<Record>> {
        let mut out = Vec::new();
        for block in self.blocks.iter().skip(1) {
            let record = block.decode_payload()?;
            if record.owner == address {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Up to `limit` blocks starting at `from`, capped at `MAX_BLOCKS_PER_REQUEST`.
    pub fn blocks_range(&self, from: u64, limit: u32) -> &[Block] {
        let len = self.blocks.len();
        let start = usize::try_from(from).unwrap_or(len).min(len);
        let limit = limit.min(MAX_BLOCKS_PER_REQUEST) as usize;
        let end = start.saturating_add(limit).min(len);
        &self.blocks[start..end]
    }
}

fn show(hash: &Option<Hash>) -> String {
    hash.map(hex::encode).unwrap_or_else(|| "none".to_string())
}

/// Checks position, linkage and self-hash of every block, reporting defects
/// in position order (position, then linkage, then self-hash per block).
pub fn validate_blocks(blocks: &[Block], hasher: &dyn Hasher) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if block.position != i as u64 {
            errors.push(format!(
                "block {i}: stored position {} does not match its index",
                block.position
            ));
        }
        if i == 0 {
            if block.previous_fingerprint.is_some() {
                errors.push("block 0: genesis block must not reference a predecessor".into());
            }
        } else if block.previous_fingerprint != blocks[i - 1].fingerprint {
            errors.push(format!(
                "block {i}: previous fingerprint {} does not match fingerprint {} of block {}",
                show(&block.previous_fingerprint),
                show(&blocks[i - 1].fingerprint),
                i - 1
            ));
        }
        let recomputed = block.recompute_fingerprint(hasher);
        if block.fingerprint != Some(recomputed) {
            errors.push(format!(
                "block {i}: stored fingerprint {} does not match recomputed {}",
                show(&block.fingerprint),
                hex::encode(recomputed)
            ));
        }
    }
    errors
}
