//! HTTP interface: the administrative API for workflow definitions and
//! direct event submission.

pub mod http;

pub use http::{router, AppState};
