//! TIMEHACK Cue Engine - presentation events derived from authoritative time
//!
//! Evaluated once per rendered frame:
//! - Countdown stages (STANDBY, digits, HACK) over seconds 50-59 and 0
//! - Boundary flashes at :00 and :30
//! - Default "in one minute" / "in 30 seconds" announcement text
//!
//! Everything here is pure state transition over a second value and a
//! monotonic timestamp; nothing can fail.

pub mod announce;
pub mod flash;
pub mod scheduler;

pub use announce::*;
pub use flash::*;
pub use scheduler::*;
