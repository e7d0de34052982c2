//! Shared data models for the VidGen backend.
//!
//! This crate provides:
//! - Subscription (entitlement) records and quota gating logic
//! - Project records for completed generations
//! - Plan tiers and monthly quota limits

pub mod plan;
pub mod project;
pub mod subscription;

pub use plan::{PlanTier, DEFAULT_MONTHLY_QUOTA, FREE_MONTHLY_QUOTA, PRO_MONTHLY_QUOTA};
pub use project::{Project, ProjectStatus};
pub use subscription::{Subscription, SUBSCRIPTION_STATUS_ACTIVE};
