pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const CHALLENGE_WINDOW_SECS: u64 = 300;
pub const CHALLENGE_DOMAIN_TAG: &str = "ledgerOwnershipVerification";
pub const GENESIS_PAYLOAD: &[u8] = b"genesis";
pub const BLOCKS_PER_BATCH: u32 = 25;
pub const MAX_BLOCKS_PER_REQUEST: u32 = BLOCKS_PER_BATCH * 10;
