//! TIMEHACK Runtime - frame loop and host wiring
//!
//! Each frame:
//! 1. Read the synchronised instant
//! 2. Project it into the display zone
//! 3. Evaluate cues on the UTC second
//! 4. Sample the flash sequencer
//! 5. Hand a FrameProjection to the renderer
//!
//! Resync runs beside the frame loop as a background task; frames never
//! wait on the network.

pub mod display;
pub mod resync;
pub mod runtime;
pub mod telemetry;

pub use display::*;
pub use resync::*;
pub use runtime::*;
pub use telemetry::*;
