//! Placard: session-cached distribution of editable UI content.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
