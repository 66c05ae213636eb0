//! API layer
//!
//! HTTP handlers for:
//! - Health check and favicon (ungated)
//! - Category listings backed by esa search
//! - Redirects to esa post/member pages

mod browse;
mod health;
pub mod query;
pub mod redirect;

pub use browse::browse_router;
pub use health::health_router;
