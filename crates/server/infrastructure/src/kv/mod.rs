//! Key-value store adapters backing the dedup gate.

mod memory;
mod redis;

pub use memory::MemoryKvStore;
pub use redis::RedisKvStore;
