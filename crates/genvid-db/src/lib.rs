//! Persistence layer for the GenVid backend.
//!
//! Exposes the narrow store traits the orchestration core consumes and
//! their Postgres implementation. The core never sees SQL; it sees
//! `ProjectStore` and `CreditStore`.

pub mod error;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use postgres::{create_pool, DbPool, PgStore};
pub use store::{CreditStore, ProjectStore};
