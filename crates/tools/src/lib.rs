//! Developer tooling: read-only inspection of an environment and checks that
//! its contact managers still mirror the tree.
//!
//! # Invariants
//! - Nothing here mutates the environment.

pub mod inspector;

pub use inspector::{
    ConsistencyIssue, ConsistencyReport, EnvironmentInspector, EnvironmentSummary, LinkInfo,
};
