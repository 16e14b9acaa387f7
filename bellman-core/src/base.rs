//! Core functionalities.
mod agent;
mod env;
mod transition;
pub use agent::Agent;
pub use env::Env;
pub use transition::{Step, Transition};
