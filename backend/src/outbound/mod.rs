//! Driven adapters implementing the domain's ports.

pub mod persistence;
pub mod security;
