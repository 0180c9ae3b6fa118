mod client;
mod config;

pub use client::SqsQueueClient;
pub use config::SqsConfig;
