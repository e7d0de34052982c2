//! S3-compatible object storage for generation artifacts.
//!
//! This crate provides:
//! - Byte upload/delete against an R2 bucket
//! - Public URL construction and presigned URL fallback
//! - Per-user key namespacing for input images and output videos
//! - Key derivation from stored URLs (for teardown)

pub mod client;
pub mod error;
pub mod keys;

pub use client::{ObjectStore, R2Config, R2ObjectStore};
pub use error::{StorageError, StorageResult};
pub use keys::{input_image_key, key_from_url, output_video_key};
