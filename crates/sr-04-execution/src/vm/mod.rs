//! # Module Virtual Machine
//!
//! The deterministic stack machine contract modules compile to, and the
//! metered interpreter that runs them.

pub mod costs;
pub mod instr;
pub mod machine;
pub mod module;

pub use instr::Instr;
pub use machine::Machine;
pub use module::CompiledModule;
