//! Task manager backend: domain services behind HTTP adapters.
//!
//! Layout follows a hexagonal split: `domain` holds the services and the
//! ports they depend on, `outbound` implements those ports (Diesel/SQLite
//! persistence, Argon2 hashing), and `inbound` translates HTTP requests
//! into domain calls for both the JSON API and the server-rendered pages.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use middleware::Trace;
