//! Cross-crate integration scenarios.

pub mod harness;
pub mod nested_calls;
pub mod program_flow;
pub mod static_context;
pub mod upgrade_flow;
