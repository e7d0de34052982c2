//! Request handlers.

pub mod billing;
pub mod entitlement;
pub mod generate;
pub mod health;
pub mod projects;

pub use billing::*;
pub use entitlement::*;
pub use generate::*;
pub use health::*;
pub use projects::*;
