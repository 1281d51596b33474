//! Infrastructure implementations.
//!
//! Contains port trait implementations for host collaborators.

pub mod cipher;
pub mod config;
pub mod operations;
pub mod ports;
pub mod refresh;
