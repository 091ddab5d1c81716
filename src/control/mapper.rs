//! Target mapper — smoothed pixel offset → bounded target angle.
//!
//! [`TargetMapper`] owns the pixel→degree conversion and the feedback
//! [`Controller`].  It only ever computes a new *target* for the motor
//! loop to chase; it never touches the servo, which is what lets the
//! perception rate (10–60 Hz, at the mercy of the detector) stay decoupled
//! from the actuation rate.

use crate::config::{CameraConfig, ControllerConfig};
use crate::control::controller::{build_controller, Controller};
use crate::state::clamp_angle;

// ---------------------------------------------------------------------------
// TargetMapper
// ---------------------------------------------------------------------------

/// Converts a smoothed pixel offset into a clamped target angle.
///
/// # Example
///
/// ```rust
/// use pan_tracker::config::{CameraConfig, ControllerConfig};
/// use pan_tracker::control::TargetMapper;
///
/// let mut mapper = TargetMapper::from_config(
///     &CameraConfig::default(),      // 640 px / 77° ≈ 8.3 px/deg
///     &ControllerConfig::default(),  // proportional, Kp = 0.15
/// );
///
/// // 200 px right of center from 90° → nudge ≈ 3.6° right
/// let target = mapper.map(200.0, 90.0, 0.1);
/// assert!((target - 93.6).abs() < 0.1);
/// ```
pub struct TargetMapper {
    pixels_per_degree: f64,
    controller: Box<dyn Controller>,
}

impl TargetMapper {
    /// Create a mapper with an explicit pixel ratio and controller.
    pub fn new(pixels_per_degree: f64, controller: Box<dyn Controller>) -> Self {
        Self {
            pixels_per_degree,
            controller,
        }
    }

    /// Create a mapper from camera geometry and controller config.
    pub fn from_config(camera: &CameraConfig, controller: &ControllerConfig) -> Self {
        Self::new(camera.pixels_per_degree(), build_controller(controller))
    }

    /// Map a smoothed offset (pixels, signed) to the next target angle.
    ///
    /// `current_angle` is where the servo is right now; `dt` is the
    /// seconds since the previous `map` call (feeds the controller's
    /// integral/derivative terms).  The result is already clamped to the
    /// commandable range.
    pub fn map(&mut self, filtered_offset: f64, current_angle: f64, dt: f64) -> f64 {
        let angle_error = filtered_offset / self.pixels_per_degree;
        let delta = self.controller.update(angle_error, dt);
        clamp_angle(current_angle + delta)
    }

    /// Forget all controller state (target lost).
    pub fn reset(&mut self) {
        self.controller.reset();
    }

    /// Forget only derivative memory (deadband sample).
    pub fn reset_derivative(&mut self) {
        self.controller.reset_derivative();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerKind;

    fn default_mapper() -> TargetMapper {
        TargetMapper::from_config(&CameraConfig::default(), &ControllerConfig::default())
    }

    /// 200 px at 8.3 px/deg with Kp = 0.15 nudges the target ≈ 3.6°.
    #[test]
    fn nudges_proportionally_to_offset() {
        let mut mapper = default_mapper();
        let target = mapper.map(200.0, 90.0, 0.1);

        // 200 / (640/77) ≈ 24.06°, × 0.15 ≈ 3.61°
        assert!((target - 93.61).abs() < 0.05);
    }

    /// Offsets left of center move the target down.
    #[test]
    fn negative_offset_moves_left() {
        let mut mapper = default_mapper();
        let target = mapper.map(-200.0, 90.0, 0.1);
        assert!(target < 90.0);
        assert!((target - 86.39).abs() < 0.05);
    }

    /// The result never leaves the commandable range.
    #[test]
    fn target_is_clamped_to_range() {
        let mut mapper = default_mapper();
        assert_eq!(mapper.map(10_000.0, 179.0, 0.1), 180.0);
        assert_eq!(mapper.map(-10_000.0, 1.0, 0.1), 0.0);
    }

    /// Per-update change is bounded by the rate limit even for huge
    /// offsets.
    #[test]
    fn step_is_rate_limited() {
        let cfg = ControllerConfig::default(); // max_step = 4°
        let mut mapper = TargetMapper::from_config(&CameraConfig::default(), &cfg);

        let target = mapper.map(5_000.0, 90.0, 0.1);
        assert!((target - 94.0).abs() < 1e-9);
    }

    /// A PID mapper converges on a steady offset without exceeding the
    /// rate limit on any single update.
    #[test]
    fn pid_mapper_steps_stay_bounded() {
        let mut cfg = ControllerConfig::default();
        cfg.kind = ControllerKind::Pid;
        cfg.ki = 0.05;
        let mut mapper = TargetMapper::from_config(&CameraConfig::default(), &cfg);

        let mut angle = 90.0;
        for _ in 0..50 {
            let next = mapper.map(150.0, angle, 0.05);
            assert!((next - angle).abs() <= cfg.max_step_degrees + 1e-9);
            angle = next;
        }
        assert!(angle > 90.0);
    }
}
