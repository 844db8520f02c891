//! HTTP handlers: parse the request, call a service, shape the envelope.

pub mod admin;
pub mod devices;
mod params;
pub mod problems;
pub mod remotes;
pub mod sessions;
pub mod steps;
pub mod tv_interfaces;
pub use params::*;
