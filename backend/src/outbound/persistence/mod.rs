//! Diesel/SQLite persistence adapters for the domain's storage ports.

mod diesel_task_repository;
mod diesel_user_repository;
mod models;
pub mod pool;
mod schema;

pub use diesel_task_repository::DieselTaskRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolError, build_in_memory_pool, build_pool};
