//! Perception subsystem — detector boundary and the adapter loop.
//!
//! ```text
//! Detector::poll (blocking, 10–60 Hz)
//!     └─▶ PerceptionAdapter
//!           ├─ confidence gate
//!           ├─ OffsetFilter (EMA + deadband)
//!           ├─ TargetMapper (Controller)
//!           └─▶ MotionState.target_angle   (last-write-wins)
//! ```

pub mod adapter;
pub mod detector;

pub use adapter::PerceptionAdapter;
pub use detector::{Detection, Detector, DetectorError, NullDetector};
