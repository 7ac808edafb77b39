//! TIMEHACK Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by the clock and cue crates:
//! - Time primitives (UtcInstant, MonotonicMs)
//! - Wall-clock projections (ZoneComponents, MinuteMark)
//! - Error taxonomy
//! - Display configuration

pub mod config;
pub mod error;
pub mod time;
pub mod zone;

pub use config::*;
pub use error::*;
pub use time::*;
pub use zone::*;
