use crate::constants::GENESIS_PAYLOAD;
use crate::error::{LedgerError, Result};
use crate::hasher::Hasher;
use crate::Hash;
use serde::{Deserialize, Serialize};

/// Application record carried in a block payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub owner: String,
    pub data: serde_json::Value,
}

impl Record {
    pub fn new(owner: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            owner: owner.into(),
            data,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(LedgerError::Encode)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub position: u64,
    pub timestamp: u64,
    #[serde(with = "crate::opt_hash_hex")]
    pub previous_fingerprint: Option<Hash>,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    /// Absent until the chain commits the block.
    #[serde(with = "crate::opt_hash_hex")]
    pub fingerprint: Option<Hash>,
}

impl Block {
    /// A candidate block; position, timestamp, linkage and fingerprint are
    /// assigned by `Chain::append`.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            position: 0,
            timestamp: 0,
            previous_fingerprint: None,
            payload,
            fingerprint: None,
        }
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self::new(record.encode()?))
    }

    pub fn genesis() -> Self {
        Self::new(GENESIS_PAYLOAD.to_vec())
    }

    pub fn is_genesis(&self) -> bool {
        self.position == 0
    }

    /// Canonical byte form of every field except the fingerprint.
    pub fn preimage(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 8 + 1 + 32 + 8 + self.payload.len());
        bytes.extend_from_slice(&self.position.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        match &self.previous_fingerprint {
            Some(prev) => {
                bytes.push(1);
                bytes.extend_from_slice(prev);
            }
            None => {
                bytes.push(0);
                bytes.extend_from_slice(&[0u8; 32]);
            }
        }
        bytes.extend_from_slice(&(self.payload.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    pub fn recompute_fingerprint(&self, hasher: &dyn Hasher) -> Hash {
        hasher.digest(&self.preimage())
    }

    pub fn validate_self(&self, hasher: &dyn Hasher) -> bool {
        self.fingerprint == Some(self.recompute_fingerprint(hasher))
    }

    pub fn decode_payload(&self) -> Result<Record> {
        if self.is_genesis() {
            return Err(LedgerError::GenesisPayload);
        }
        serde_json::from_slice(&self.payload).map_err(|source| LedgerError::Decode {
            position: self.position,
            source,
        })
    }

    pub fn fingerprint_hex(&self) -> Option<String> {
        self.fingerprint.map(hex::encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256Hasher;
    use serde_json::json;

    fn sealed_block() -> Block {
        let record = Record::new("addrA", json!({ "name": "deed", "value": 7 }));
        let mut block = Block::from_record(&record).unwrap();
        block.position = 1;
        block.timestamp = 1_600_000_000;
        block.previous_fingerprint = Some([9u8; 32]);
        block.fingerprint = Some(block.recompute_fingerprint(&Sha256Hasher));
        block
    }

    #[test]
    fn preimage_layout_example() {
        let block = sealed_block();
        let bytes = block.preimage();
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1_600_000_000u64.to_le_bytes());
        assert_eq!(bytes[16], 1);
        assert_eq!(&bytes[17..49], &[9u8; 32]);
        assert_eq!(&bytes[49..57], &(block.payload.len() as u64).to_le_bytes());
        assert_eq!(&bytes[57..], block.payload.as_slice());
    }

    #[test]
    fn preimage_ignores_fingerprint() {
        let mut block = sealed_block();
        let before = block.preimage();
        block.fingerprint = Some([1u8; 32]);
        assert_eq!(before, block.preimage());
    }

    #[test]
    fn absent_and_zero_previous_differ() {
        let mut a = Block::new(b"x".to_vec());
        let mut b = a.clone();
        a.previous_fingerprint = None;
        b.previous_fingerprint = Some([0u8; 32]);
        assert_ne!(
            a.recompute_fingerprint(&Sha256Hasher),
            b.recompute_fingerprint(&Sha256Hasher)
        );
    }

    #[test]
    fn validate_self_example() {
        let mut block = sealed_block();
        assert!(block.validate_self(&Sha256Hasher));
        block.payload.push(b' ');
        assert!(!block.validate_self(&Sha256Hasher));
    }

    #[test]
    fn unsealed_block_is_not_valid() {
        let block = Block::new(b"{}".to_vec());
        assert!(!block.validate_self(&Sha256Hasher));
    }

    #[test]
    fn decode_payload_inverse() {
        let record = Record::new("addrA", json!({ "name": "deed", "value": 7 }));
        let block = sealed_block();
        assert_eq!(block.decode_payload().unwrap(), record);
    }

    #[test]
    fn decode_genesis_fails() {
        let genesis = Block::genesis();
        assert!(matches!(
            genesis.decode_payload(),
            Err(LedgerError::GenesisPayload)
        ));
    }

    #[test]
    fn decode_garbage_fails() {
        let mut block = Block::new(vec![0xff, 0x00, 0x13]);
        block.position = 3;
        match block.decode_payload() {
            Err(LedgerError::Decode { position, .. }) => assert_eq!(position, 3),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn block_serialization_example() {
        let block = sealed_block();
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["position"], 1);
        assert_eq!(json["previous_fingerprint"], hex::encode([9u8; 32]));
        assert_eq!(json["payload"], hex::encode(&block.payload));
        assert_eq!(
            json["fingerprint"],
            hex::encode(block.fingerprint.unwrap())
        );
        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn genesis_serializes_absent_links_as_null() {
        let json = serde_json::to_value(Block::genesis()).unwrap();
        assert!(json["previous_fingerprint"].is_null());
        assert!(json["fingerprint"].is_null());
    }
}
