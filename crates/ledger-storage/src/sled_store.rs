use anyhow::{bail, Context, Result};
use ledger_core::{Block, ChainStore, Hash};
use sled::{Db, IVec, Tree};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";

/// Blocks keyed by big-endian position so iteration order is chain order.
/// The blocks tree is the only record of the tip; a single insert commits a block.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let db = sled::open(path.as_ref())
      .with_context(|| format!("opening sled at {}", path.as_ref().display()))?;
    let blocks = db.open_tree(TREE_BLOCKS).context("opening blocks tree")?;
    info!("sled store opened");
    Ok(Self { db, blocks })
  }

  pub fn get_block(&self, position: u64) -> Result<Option<Block>> {
    self
      .blocks
      .get(position.to_be_bytes())?
      .map(|ivec: IVec| decode(position, &ivec))
      .transpose()
  }

  /// Position of the last stored block, read from the blocks tree itself.
  pub fn tip_height(&self) -> Result<Option<u64>> {
    self
      .blocks
      .last()?
      .map(|(key, _)| {
        let key = <[u8; 8]>::try_from(&key[..]).context("corrupt block key")?;
        Ok::<_, anyhow::Error>(u64::from_be_bytes(key))
      })
      .transpose()
  }

  pub fn tip_hash(&self) -> Result<Option<Hash>> {
    let Some((key, value)) = self.blocks.last()? else {
      return Ok(None);
    };
    let key = <[u8; 8]>::try_from(&key[..]).context("corrupt block key")?;
    Ok(decode(u64::from_be_bytes(key), &value)?.fingerprint)
  }

  pub fn close(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }

  pub fn clear(&self) -> Result<()> {
    self.blocks.clear()?;
    self.db.flush()?;
    Ok(())
  }
}

fn decode(position: u64, bytes: &[u8]) -> Result<Block> {
  bincode::deserialize(bytes).with_context(|| format!("decoding stored block {position}"))
}

impl ChainStore for SledStore {
  fn load_all(&self) -> Result<Vec<Block>> {
    let mut out = Vec::new();
    for entry in self.blocks.iter() {
      let (key, value) = entry?;
      let key = <[u8; 8]>::try_from(&key[..]).context("corrupt block key")?;
      out.push(decode(u64::from_be_bytes(key), &value)?);
    }
    debug!(blocks = out.len(), "blocks loaded");
    Ok(out)
  }

  fn append_one(&self, block: &Block) -> Result<()> {
    let expected = match self.tip_height()? {
      Some(h) => h + 1,
      None => 0,
    };
    if block.position != expected {
      bail!(
        "refusing to store block {} out of order (next position is {expected})",
        block.position
      );
    }
    if block.fingerprint.is_none() {
      bail!("refusing to store unsealed block {}", block.position);
    }

    let key = block.position.to_be_bytes();
    let bytes = bincode::serialize(block)?;
    self
      .blocks
      .compare_and_swap(key, None as Option<&[u8]>, Some(bytes))?
      .map_err(|_| anyhow::anyhow!("block {} already stored", block.position))?;

    // The caller drops the block on error, so the store must not keep it either.
    if let Err(e) = self.db.flush() {
      self.blocks.remove(key)?;
      return Err(e).context(format!("flushing block {}", block.position));
    }
    Ok(())
  }
}
