pub mod common;

pub mod a001_batch;
pub mod a002_batch_event;
