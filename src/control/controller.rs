//! Feedback controllers — proportional and PID.
//!
//! # Overview
//!
//! [`Controller`] is the interface the target mapper drives: one angle
//! error in, one rate-limited angle delta out.  Two implementations exist
//! and are selected from [`ControllerConfig`] at startup:
//!
//! * [`Proportional`] — `Δ = clamp(Kp·error, ±max_step)`.  Stateless.
//! * [`Pid`] — adds a clamped integral term (anti-windup) and a derivative
//!   term that is itself EMA-smoothed before being multiplied by `Kd`, so
//!   frame-to-frame detector noise does not land on the servo.
//!
//! Both variants apply the same output rate limit, so switching the
//! configured kind never changes the worst-case step size.

use crate::config::{ControllerConfig, ControllerKind};

// ---------------------------------------------------------------------------
// Controller trait
// ---------------------------------------------------------------------------

/// One `update` per perception sample: angle error in degrees → requested
/// target change in degrees.
///
/// Implementations must be `Send` so the perception task can own one.
pub trait Controller: Send {
    /// Compute the target delta for `error` (degrees), where `dt` is the
    /// seconds elapsed since the previous update.
    fn update(&mut self, error: f64, dt: f64) -> f64;

    /// Forget everything — called when target acquisition is lost.
    fn reset(&mut self);

    /// Forget only derivative memory — called when the input filter
    /// reports a deadband sample, so the derivative does not spike when
    /// motion resumes.
    fn reset_derivative(&mut self);
}

/// Build the configured controller variant.
pub fn build_controller(cfg: &ControllerConfig) -> Box<dyn Controller> {
    match cfg.kind {
        ControllerKind::Proportional => Box::new(Proportional::new(cfg.kp, cfg.max_step_degrees)),
        ControllerKind::Pid => Box::new(Pid::new(cfg)),
    }
}

// ---------------------------------------------------------------------------
// Proportional
// ---------------------------------------------------------------------------

/// Proportional-only controller.
///
/// # Example
///
/// ```rust
/// use pan_tracker::control::{Controller, Proportional};
///
/// let mut p = Proportional::new(0.15, 4.0);
/// let delta = p.update(24.1, 0.1); // ≈ 3.6°
/// assert!((delta - 3.615).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct Proportional {
    kp: f64,
    max_step: f64,
}

impl Proportional {
    /// Create a proportional controller with gain `kp` and per-update
    /// output limit `max_step` (degrees).
    pub fn new(kp: f64, max_step: f64) -> Self {
        Self { kp, max_step }
    }
}

impl Controller for Proportional {
    fn update(&mut self, error: f64, _dt: f64) -> f64 {
        (self.kp * error).clamp(-self.max_step, self.max_step)
    }

    fn reset(&mut self) {}

    fn reset_derivative(&mut self) {}
}

// ---------------------------------------------------------------------------
// Pid
// ---------------------------------------------------------------------------

/// PID controller with integral anti-windup and a filtered derivative.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    /// EMA factor for the raw derivative.
    beta: f64,
    integral_limit: f64,
    max_step: f64,

    // State
    integral: f64,
    previous_error: f64,
    filtered_derivative: f64,
}

impl Pid {
    /// Create a PID controller from config gains.
    pub fn new(cfg: &ControllerConfig) -> Self {
        Self {
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
            beta: cfg.derivative_smoothing,
            integral_limit: cfg.integral_limit,
            max_step: cfg.max_step_degrees,
            integral: 0.0,
            previous_error: 0.0,
            filtered_derivative: 0.0,
        }
    }

    /// Accumulated integral term (degrees·seconds), for diagnostics.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

impl Controller for Pid {
    fn update(&mut self, error: f64, dt: f64) -> f64 {
        let p = self.kp * error;

        let (i, d) = if dt > 0.0 {
            // Anti-windup: the integral never accumulates past the clamp.
            self.integral = (self.integral + error * dt)
                .clamp(-self.integral_limit, self.integral_limit);

            let raw_derivative = (error - self.previous_error) / dt;
            self.filtered_derivative =
                self.beta * raw_derivative + (1.0 - self.beta) * self.filtered_derivative;

            (self.ki * self.integral, self.kd * self.filtered_derivative)
        } else {
            (self.ki * self.integral, 0.0)
        };

        self.previous_error = error;

        (p + i + d).clamp(-self.max_step, self.max_step)
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.filtered_derivative = 0.0;
    }

    fn reset_derivative(&mut self) {
        self.previous_error = 0.0;
        self.filtered_derivative = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
