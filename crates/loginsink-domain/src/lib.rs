pub mod error;
pub mod event;
pub mod ingest_service;
pub mod masking;
pub mod message;
pub mod normalizer;
pub mod queue;
pub mod record;
pub mod repository;

pub use error::{IngestError, IngestResult};
pub use event::LoginEvent;
pub use ingest_service::LoginIngestService;
pub use masking::mask;
pub use message::RawMessage;
pub use normalizer::normalize;
pub use queue::MessageQueue;
pub use record::LoginRecord;
pub use repository::{DeadLetterRepository, LoginRecordRepository, RecordFailureInput};

#[cfg(any(test, feature = "testing"))]
pub use queue::MockMessageQueue;
#[cfg(any(test, feature = "testing"))]
pub use repository::{MockDeadLetterRepository, MockLoginRecordRepository};
