//! Infrastructure adapters and runtime bootstrap.

pub mod document;
pub mod error;
pub mod http;
pub mod telemetry;
