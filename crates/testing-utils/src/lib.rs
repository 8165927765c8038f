//! # Teamform Testing Utils
//!
//! Shared testing utilities for the team formation workspace: candidate
//! builders, ready-made candidate pools, a configurable mock repository and
//! async wait helpers.
//!
//! ```toml
//! [dev-dependencies]
//! teamform-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
