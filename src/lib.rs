//! Tollbooth - Per-Client Request Admission Service
//!
//! This crate implements an in-memory, single-process request admission layer
//! for HTTP services. Each client, identified by source address, is granted a
//! token bucket; requests are admitted while tokens remain and rejected
//! otherwise. A background sweep evicts clients that have gone idle, bounding
//! memory under high client churn.

pub mod admission;
pub mod config;
pub mod error;
pub mod http;
