//! Ownership-verified submission.
//!
//! A caller asks for a challenge, signs it with the key behind its address and
//! submits the signature together with the record. Challenges are
//! self-describing (`<address>:<epochSeconds>:<domainTag>`), so nothing is kept
//! between issuance and submission.

use crate::block::{Block, Record};
use crate::chain::Chain;
use crate::clock::{Clock, SystemClock};
use crate::constants::{CHALLENGE_DOMAIN_TAG, CHALLENGE_WINDOW_SECS};
use crate::error::{LedgerError, Result};
use crate::verifier::{Ed25519Verifier, SignatureVerifier};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub address: String,
    pub issued_at: u64,
}

impl Challenge {
    pub fn parse(message: &str) -> Result<Self> {
        let parts: Vec<&str> = message.split(':').collect();
        let &[address, secs, tag] = parts.as_slice() else {
            return Err(LedgerError::MalformedChallenge(
                "expected <address>:<epochSeconds>:<domainTag>".into(),
            ));
        };
        if tag != CHALLENGE_DOMAIN_TAG {
            return Err(LedgerError::MalformedChallenge(format!(
                "unknown domain tag {tag:?}"
            )));
        }
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::MalformedChallenge(format!(
                "bad timestamp {secs:?}"
            )));
        }
        let issued_at = secs.parse::<u64>().map_err(|_| {
            LedgerError::MalformedChallenge(format!("bad timestamp {secs:?}"))
        })?;
        if address.is_empty() {
            return Err(LedgerError::MalformedChallenge("empty address".into()));
        }
        Ok(Self {
            address: address.to_string(),
            issued_at,
        })
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.address, self.issued_at, CHALLENGE_DOMAIN_TAG)
    }
}

pub struct SubmissionWorkflow {
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
}

impl Default for SubmissionWorkflow {
    fn default() -> Self {
        Self::new(Arc::new(Ed25519Verifier), Arc::new(SystemClock))
    }
}

impl SubmissionWorkflow {
    pub fn new(verifier: Arc<dyn SignatureVerifier>, clock: Arc<dyn Clock>) -> Self {
        Self { verifier, clock }
    }

    pub fn issue_challenge(&self, address: &str) -> String {
        let challenge = Challenge {
            address: address.to_string(),
            issued_at: self.clock.now_secs(),
        };
        info!(address, issued_at = challenge.issued_at, "challenge issued");
        challenge.to_string()
    }

    /// Checks the challenge binding, its freshness and the signature, then
    /// appends `{owner: address, data}` to the chain.
    pub fn submit(
        &self,
        chain: &mut Chain,
        address: &str,
        message: &str,
        signature: &str,
        data: serde_json::Value,
    ) -> Result<Block> {
        let challenge = Challenge::parse(message)?;
        if challenge.address != address {
            return Err(LedgerError::MalformedChallenge(
                "challenge was issued to a different address".into(),
            ));
        }

        let now = self.clock.now_secs();
        if now.saturating_sub(challenge.issued_at) > CHALLENGE_WINDOW_SECS {
            debug!(address, issued_at = challenge.issued_at, now, "challenge expired");
            return Err(LedgerError::ExpiredChallenge {
                issued_at: challenge.issued_at,
                now,
            });
        }

        if !self.verifier.verify(message, address, signature) {
            debug!(address, "signature rejected");
            return Err(LedgerError::InvalidSignature);
        }

        let block = Block::from_record(&Record::new(address, data))?;
        let committed = chain.append(block)?.clone();
        info!(address, position = committed.position, "submission committed");
        Ok(committed)
    }
}
