//! HTTP handlers

pub mod error;
pub mod health;
pub mod products;

pub use health::health;
