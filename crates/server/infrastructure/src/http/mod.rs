//! Outbound HTTP adapter.

mod client;

pub use client::ReqwestHttpClient;
