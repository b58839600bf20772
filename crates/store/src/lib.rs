//! Storage adapters for the storefront.
//!
//! Two implementations of the domain's storage ports:
//! - [`MemoryStore`] — everything behind one `RwLock`, used by tests and
//!   the default server configuration
//! - [`PgStore`] — PostgreSQL via sqlx, with conditional stock updates and
//!   a transaction around the checkout commit

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::seed_demo_catalog;
