//! In-process backends built on DashMap
//!
//! Substitutes for PostgreSQL and Redis in tests and in the server's
//! `memory` backend mode.

pub mod cache;
pub mod store;

pub use cache::MemoryRecordCache;
pub use store::{MemoryProductStore, StoreCalls};
