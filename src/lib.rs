//! HTTP adapter between a dashboard client and the vendor's edge analytics API.
//!
//! Each inbound query is mapped to a vendor action, signed with HMAC-SHA1,
//! sent upstream once, and the response reshaped into a single contract.

pub mod api;
pub mod canonical;
pub mod catalog;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod request;
pub mod signer;
pub mod timestamp;

pub use error::{ProxyError, Result};
