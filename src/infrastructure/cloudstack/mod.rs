//! CloudStack API access - request signing and the usage listing client

mod client;
mod config;
pub mod signer;

pub use client::CloudStackClient;
pub use config::CloudStackConfig;
