#![doc = include_str!("../README.md")]

pub mod config;
pub mod export;
pub mod orders;
pub mod rows;
pub mod sheets;
pub mod usd;

pub use config::Credentials;
pub use orders::{Order, OrdersClient};
pub use rows::{extract_rows, ExportRow};
pub use usd::Usd;
