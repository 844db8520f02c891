//! Per-entity services: parameterized SQL behind typed operations.

pub mod admin;
pub mod change_log;
pub mod devices;
pub mod problems;
pub mod remotes;
pub mod sessions;
pub mod steps;
pub mod tv_interfaces;
mod validation;
pub use validation::*;
