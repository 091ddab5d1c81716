//! Motor subsystem — servo driver boundary and the interpolation loop.
//!
//! # Architecture
//!
//! ```text
//! MotionState.target_angle ──▶ MotorLoop (fixed tick, tanh S-curve)
//!                                  │  one bounded step per tick
//!                                  ▼
//!                             ServoDriver::set_command(angle)
//!                                  │  angle_to_duty (pure, linear)
//!                                  ▼
//!                             PWM backend / NullServo
//! ```
//!
//! The loop is the single writer of `current_angle`; everything else only
//! moves the target.

pub mod control_loop;
pub mod driver;

pub use control_loop::{MotorLoop, TickState};
pub use driver::{angle_to_duty, NullServo, ServoDriver, ServoError};
