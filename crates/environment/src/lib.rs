//! Environment: the authoritative kinematic tree and the contact managers
//! that mirror it.
//!
//! # Invariants
//! - Structural mutation only goes through [`Environment`]; managers are told
//!   about every change, discrete first, then continuous.
//! - After any successful call, every attached manager reports an active
//!   list element-wise equal to [`Environment::active_link_names`].
//! - A failed call leaves the tree and the managers as they were.

pub mod acm;
pub mod active;
pub mod config;
pub mod environment;
pub mod error;
pub mod event;

pub use acm::{AllowedCollision, AllowedCollisionMatrix};
pub use active::compute_active_links;
pub use config::{ConfigError, EnvironmentConfig};
pub use environment::{ADJACENT_REASON, Environment};
pub use error::EnvironmentError;
pub use event::EnvironmentEvent;
