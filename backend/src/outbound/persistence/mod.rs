//! PostgreSQL persistence adapters using Diesel.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL through `diesel-async` with `bb8` connection pooling.
//!
//! The adapters are thin: they translate between Diesel rows and domain
//! types and hold no business logic. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay internal to this module, and every
//! database failure is mapped into the owning port's error type.

mod diesel_demo_seed;
pub(crate) mod diesel_helpers;
mod diesel_item_repository;
mod diesel_member_repository;
mod diesel_order_query_repository;
mod diesel_order_repository;
mod models;
mod pool;
mod schema;

pub use diesel_demo_seed::{SeedError, SeedOutcome, seed_demo_data};
pub use diesel_item_repository::DieselItemRepository;
pub use diesel_member_repository::DieselMemberRepository;
pub use diesel_order_query_repository::DieselOrderQueryRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
