use crate::Hash;
use sha2::{Digest, Sha256};

/// Deterministic digest over a block preimage. Same bytes in, same digest out,
/// across calls and processes.
pub trait Hasher: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> Hash;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn digest(&self, bytes: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let h = Sha256Hasher.digest(b"abc");
        assert_eq!(
            hex::encode(h),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(Sha256Hasher.digest(b"ledger"), Sha256Hasher.digest(b"ledger"));
        assert_ne!(Sha256Hasher.digest(b"ledger"), Sha256Hasher.digest(b"ledgeR"));
    }
}
