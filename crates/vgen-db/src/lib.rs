//! Postgres data access for the VidGen backend.
//!
//! Repositories are trait objects so handlers and services can be tested
//! against in-memory implementations. The live implementations run plain
//! parameterized queries over a shared [`sqlx::PgPool`].

pub mod error;
pub mod pool;
pub mod projects;
pub mod subscriptions;

pub use error::{DbError, DbResult};
pub use pool::connect_from_env;
pub use projects::{PgProjectStore, ProjectStore};
pub use subscriptions::{CheckoutUpsert, PgSubscriptionStore, SubscriptionStore};
