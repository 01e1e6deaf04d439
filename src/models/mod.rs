//! Data models for the blob service.

mod blob;

pub use blob::*;
