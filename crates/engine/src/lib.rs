//! Callgate engine library.
//!
//! Offers encrypted callback URLs for registered operations and dispatches
//! inbound calls on them.
//!
//! ## Structure
//!
//! - `use_cases/` - Callback offer (codec) and dispatch
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
