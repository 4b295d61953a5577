//! HTTP adapters for the asset store.

mod client;

pub use client::{CSRF_HEADER, StoreClient};
