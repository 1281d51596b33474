//! Use cases - callback offer and dispatch orchestration.

pub mod callback;

pub use callback::CallbackUseCases;
