//! Native JSON-RPC client for Ethereum-compatible endpoints.
//!
//! Implements [`LedgerRpc`](super::LedgerRpc) over JSON-RPC using `reqwest`,
//! with support for HTTP(S) transport, optional request rate limiting and
//! basic auth.

mod client;
mod connection;
mod protocol;

pub use client::HttpRpcClient;
