//! Durable block storage.

pub mod block_store;

pub use block_store::BlockStore;
