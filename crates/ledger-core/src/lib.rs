pub mod block;
pub mod chain;
pub mod clock;
pub mod constants;
pub mod error;
pub mod handle;
pub mod hasher;
pub mod submission;
pub mod verifier;

pub use block::{Block, Record};
pub use chain::{validate_blocks, Chain, ChainStore};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LedgerError, Result};
pub use handle::ChainHandle;
pub use hasher::{Hasher, Sha256Hasher};
pub use submission::{Challenge, SubmissionWorkflow};
pub use verifier::{address_of, sign_challenge, Ed25519Verifier, SignatureVerifier};

pub type Hash = [u8; 32];

/// Hex helpers for optional digests, so blocks read the same in JSON and on disk.
pub(crate) mod opt_hash_hex {
    use super::Hash;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Hash>, s: S) -> Result<S::Ok, S::Error> {
        value.map(hex::encode).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Hash>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| {
            let mut out = [0u8; 32];
            hex::decode_to_slice(&s, &mut out).map_err(D::Error::custom)?;
            Ok(out)
        })
        .transpose()
    }
}
