pub mod cache;
pub mod codec;
pub mod error;
pub mod fetcher;
pub mod lookup;
pub mod mapper;
pub mod rpc;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_util;

pub use error::CoreError;
pub use lookup::LookupService;
pub use types::{ApiTransaction, RequesterId};
