//! Business logic services.

pub mod billing;
pub mod entitlement;
pub mod generation;
pub mod projects;
pub mod stripe;

pub use billing::BillingService;
pub use entitlement::EntitlementService;
pub use generation::{GenerationOutcome, GenerationService, UploadedImage};
pub use projects::ProjectService;

#[cfg(test)]
pub(crate) mod test_store;
