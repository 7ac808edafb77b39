//! TIMEHACK Test Harness - simulated hosts and end-to-end scenarios
//!
//! This crate provides:
//! - A simulated authority with scripted availability
//! - Local clock drift models
//! - A simulated host driving ClockSync and the frame loop on virtual time
//! - Scenario functions exercising drift correction, outages and cue timing

pub mod scenarios;
pub mod simulator;

pub use scenarios::*;
pub use simulator::*;
