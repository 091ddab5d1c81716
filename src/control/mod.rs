//! Control pipeline — raw pixel offsets → smoothed signal → target angle.
//!
//! # Pipeline
//!
//! ```text
//! raw offset (px) → OffsetFilter (EMA + deadband)
//!                 → TargetMapper (px→deg, Controller, clamp)
//!                 → MotionState.target_angle
//! ```
//!
//! The pieces are free of I/O and timing so each can be exercised in
//! isolation; the perception adapter wires them to the detector and
//! shared state.

pub mod controller;
pub mod filter;
pub mod mapper;

pub use controller::{build_controller, Controller, Pid, Proportional};
pub use filter::OffsetFilter;
pub use mapper::TargetMapper;
