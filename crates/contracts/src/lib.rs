//! Shared data contracts for the PureTrace traceability service.
//!
//! Everything a client needs to talk to the backend lives here: the
//! identifier type, request DTOs with their validation, and the response
//! shapes for batches and their event timelines.

pub mod domain;
