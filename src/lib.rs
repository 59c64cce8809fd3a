#[cfg(feature = "audit-log")]
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod notify;
pub mod ports;
pub mod service;
pub mod vault;
