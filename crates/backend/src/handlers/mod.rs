pub mod a001_batch;
pub mod a002_batch_event;
pub mod error;
pub mod extract;
