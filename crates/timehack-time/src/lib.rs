//! TIMEHACK Time Engine - authoritative time and its wall-clock projection
//!
//! This crate implements:
//! - Time bases: the local monotonic + wall clock pair (system or manual)
//! - Authority sources: ranked endpoint fetch with local fallback
//! - ClockSync: drift-corrected estimate of authoritative UTC
//! - CalendarProjector: zone conversion and next-minute boundaries

pub mod calendar;
pub mod clock;
pub mod parse;
pub mod source;
pub mod sync;

pub use calendar::*;
pub use clock::*;
pub use parse::*;
pub use source::*;
pub use sync::*;
