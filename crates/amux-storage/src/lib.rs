//! Blob storage for the amux render service.
//!
//! This crate provides:
//! - The [`BlobStore`] capability consumed by the engine
//! - The key layout for chunks and artifacts
//! - A local filesystem backend with atomic writes
//! - A Cloudflare R2 (S3 API) backend
//! - An in-memory backend for development and tests

pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod local;
pub mod memory;
pub mod store;

pub use client::{R2Client, R2Config};
pub use config::{build_store, StorageBackend, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use keys::{artifact_key, chunk_key, chunk_prefix, job_prefix};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use store::{validate_key, BlobStore};
