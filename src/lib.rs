//! # locality
//!
//! Turns PIN codes and GPS coordinates into canonical Indian state and city
//! names, and validates free-text place input against a built-in gazetteer.

pub mod config;
pub mod location;

pub use config::ResolverConfig;
