mod client;
mod dead_letter_repository;
mod login_repository;

pub use client::{PostgresClient, PostgresConfig};
pub use dead_letter_repository::PostgresDeadLetterRepository;
pub use login_repository::PostgresLoginRecordRepository;
