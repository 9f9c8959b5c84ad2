//! Infrastructure adapters: NATS JetStream messaging, the Redis dedup
//! store, the reqwest HTTP client, and the in-memory counterparts used in
//! tests and single-node development. The bus consumers feeding the
//! engine and the DLQ retry loop also live here.

pub mod http;
pub mod kv;
pub mod messaging;
pub mod repositories;
