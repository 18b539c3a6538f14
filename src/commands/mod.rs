//! Command implementations
//!
//! Each module implements one CLI command: load the configuration, wire up
//! the client/store/policy, run the core component and print the run
//! summary. Fatal errors bubble up to `main`; per-branch failures stay
//! inside the components.

pub mod backup;
pub mod completions;
pub mod helpers;
pub mod provision;
pub mod restore;
pub mod version;
