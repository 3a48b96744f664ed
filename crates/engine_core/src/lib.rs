//! Core engine types for the special-stage simulation.
//!
//! This crate provides the foundational types used by the level code:
//! - 16.16 fixed-point scalars, vectors and binary angles
//! - The actor component and actor operations over a `hecs` world
//! - The tic clock
//! - Seeded per-purpose random streams
//! - Sound channel bookkeeping

pub mod actor;
pub mod angle;
pub mod components;
pub mod fixed;
pub mod random;
pub mod sound;
pub mod time;

pub use actor::*;
pub use angle::*;
pub use components::*;
pub use fixed::*;
pub use random::*;
pub use sound::*;
pub use time::*;

// Re-export commonly used types
pub use hecs::{Entity, World};
