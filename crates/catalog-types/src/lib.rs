//! Catalog Types - Pure type definitions
//!
//! This crate contains only plain data types with no runtime dependencies,
//! shared by the core repository and the HTTP service.

pub mod product;

pub use product::*;
