pub mod client;
pub mod friendbot;
pub mod horizon;
pub mod models;

#[cfg(test)]
pub mod mock;

pub use client::LedgerClient;
pub use horizon::HorizonClient;
