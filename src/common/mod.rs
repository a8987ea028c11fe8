//! Common types, traits, and error definitions for rust_crowd_planning
//!
//! This module provides the foundational building blocks used across
//! the planners, configuration spaces and agent drivers.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
