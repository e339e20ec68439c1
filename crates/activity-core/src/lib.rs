pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{RestStreamClient, StreamClient};
pub use config::AppConfig;
pub use error::ActivityError;
pub use types::{Identity, StreamMessage};
