//! xrate Common Types
//!
//! Shared types used across the xrate crates: the validated exchange
//! [`Rate`], its validation error and the timing defaults that govern
//! caching and refresh.

pub mod rate;
pub mod error;
pub mod time;

pub use rate::*;
pub use error::*;
pub use time::*;
