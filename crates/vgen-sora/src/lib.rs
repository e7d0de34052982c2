//! Client for the Azure Sora video-generation API.
//!
//! This crate provides:
//! - Job submission (image-conditioned multipart or text-only JSON)
//! - The polling state machine that drives a job to a terminal state
//! - Asset URL resolution across the response shapes the service emits
//! - Failure-reason mapping to user-facing messages
//! - Authenticated download of the generated asset

pub mod client;
pub mod error;
pub mod failure;
pub mod response;

pub use client::{GenerationParams, ImageInput, SoraClient, SoraConfig};
pub use error::{SoraError, SoraResult};
pub use failure::failure_reason_message;
pub use response::{JobResponse, JobState};
