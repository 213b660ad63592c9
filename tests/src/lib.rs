//! # Stratum Test Suite
//!
//! Cross-crate integration scenarios:
//!
//! ```text
//! tests/src/integration/
//! ├── upgrade_flow.rs    # version upgrade state machine, end to end
//! ├── program_flow.rs    # deploy / compile / call lifecycle
//! ├── static_context.rs  # write protection under static calls
//! └── nested_calls.rs    # programs calling programs via the router
//! ```
//!
//! Run with `cargo test -p sr-tests`.

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
