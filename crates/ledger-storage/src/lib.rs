//! Persistent backends for the core's `ChainStore` seam.

pub mod sled_store;

pub use sled_store::SledStore;
