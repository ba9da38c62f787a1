//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod items;
pub mod members;
pub mod orders;
pub mod responses;
pub mod simple_orders;
pub mod state;

pub use error::ApiResult;
