//! University Directory API
//!
//! A small HTTP API backing a university/course directory: CRUD endpoints
//! over a pluggable relational store for universities, courses, language-test
//! scores (IELTS/PTE), admission requirements and users, protected by
//! token-based authentication with a server-side logout blacklist.
//!
//! # Architecture
//!
//! - [`auth`]: session tokens (HS256 JWT), the revocation blacklist and the
//!   access-control middleware that guards mutating requests
//! - [`store`]: the persistence port (`Store` trait) plus an in-memory
//!   reference implementation
//! - [`api`]: the router, the generic CRUD dispatcher and the session and
//!   aggregate handlers
//! - [`server`]: process-lifetime wiring — blacklist sweeper, graceful
//!   shutdown, startup banner

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod validate;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
