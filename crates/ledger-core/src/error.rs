use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The genesis payload is a sentinel and never decodes to a record.
    #[error("the genesis block carries no record")]
    GenesisPayload,

    #[error("payload of block {position} does not decode: {source}")]
    Decode {
        position: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("record does not encode: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("chain integrity check failed: {}", .0.join("; "))]
    ChainIntegrity(Vec<String>),

    #[error("challenge issued at {issued_at} expired (now {now})")]
    ExpiredChallenge { issued_at: u64, now: u64 },

    #[error("signature does not match address")]
    InvalidSignature,

    #[error("malformed challenge: {0}")]
    MalformedChallenge(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
