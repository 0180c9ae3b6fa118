mod worker;

pub use worker::{DrainSummary, IngestWorker, IngestWorkerConfig};
