//! Servo driver boundary.
//!
//! # Overview
//!
//! [`ServoDriver`] is the seam between the control core and the PWM
//! hardware.  The core only ever asks for an angle; how that becomes a
//! pulse on a pin belongs to the driver implementation (a Raspberry Pi
//! hardware-PWM backend in the robot build).
//!
//! [`angle_to_duty`] is the one piece of actuator knowledge that lives on
//! this side of the seam: the linear map from the `[0, 180]` degree range
//! onto the servo's duty-cycle range.  It is a pure function so every
//! backend commands the same geometry.
//!
//! [`NullServo`] is the no-hardware stand-in used when the binary runs on
//! a dev machine: it logs the duty it would have written and otherwise
//! does nothing.

use thiserror::Error;

use crate::config::ServoConfig;
use crate::state::clamp_angle;

// ---------------------------------------------------------------------------
// ServoError
// ---------------------------------------------------------------------------

/// Errors surfaced by servo driver implementations.
#[derive(Debug, Clone, Error)]
pub enum ServoError {
    /// The PWM peripheral could not be claimed or configured.  Fatal at
    /// startup — the tracker refuses to run without an actuator.
    #[error("servo initialisation failed: {0}")]
    Init(String),

    /// A position command could not be written.  Non-fatal: the motor
    /// loop logs it and keeps ticking.
    #[error("servo command failed: {0}")]
    Command(String),
}

// ---------------------------------------------------------------------------
// angle_to_duty
// ---------------------------------------------------------------------------

/// Map an angle in `[0, 180]` onto the servo's duty-cycle range.
///
/// The map is linear with the range midpoint at 90°.  Out-of-range angles
/// are clamped first.
///
/// ```
/// use pan_tracker::config::ServoConfig;
/// use pan_tracker::motor::angle_to_duty;
///
/// let cfg = ServoConfig::default(); // 2.5 % – 12.5 %
/// assert_eq!(angle_to_duty(0.0, &cfg), 2.5);
/// assert_eq!(angle_to_duty(90.0, &cfg), 7.5);
/// assert_eq!(angle_to_duty(180.0, &cfg), 12.5);
/// ```
pub fn angle_to_duty(angle_degrees: f64, cfg: &ServoConfig) -> f64 {
    let angle = clamp_angle(angle_degrees);
    cfg.min_duty_percent + (angle / 180.0) * (cfg.max_duty_percent - cfg.min_duty_percent)
}

// ---------------------------------------------------------------------------
// ServoDriver trait
// ---------------------------------------------------------------------------

/// Interface to the pan servo.
///
/// Implementations must be `Send` — the motor loop owns its driver and
/// runs on whichever worker thread the runtime picks.
///
/// # Lifecycle
///
/// `home()` bounds the start of the usable period (blocking slow sweep to
/// the rest position on real hardware); `release()` bounds the end (PWM
/// off, peripheral freed).  Between the two, `set_command` may be called
/// at up to the motor loop rate.
pub trait ServoDriver: Send {
    /// Command the servo to `angle_degrees`.
    fn set_command(&mut self, angle_degrees: f64) -> Result<(), ServoError>;

    /// Move to the rest position and settle.  Called once at startup.
    fn home(&mut self) -> Result<(), ServoError>;

    /// Stop the PWM signal and free the peripheral.  Called once during
    /// teardown; afterwards no further commands are issued.
    fn release(&mut self) -> Result<(), ServoError>;
}

// ---------------------------------------------------------------------------
// NullServo
// ---------------------------------------------------------------------------

/// Driver stand-in for machines without a servo attached.
///
/// Logs each command at `debug` with the duty cycle a real backend would
/// have written, so the full command path stays observable in dev runs.
pub struct NullServo {
    cfg: ServoConfig,
    last_angle: Option<f64>,
}

impl NullServo {
    /// Create a no-hardware driver using `cfg` for the duty mapping.
    pub fn new(cfg: ServoConfig) -> Self {
        Self {
            cfg,
            last_angle: None,
        }
    }
}

impl ServoDriver for NullServo {
    fn set_command(&mut self, angle_degrees: f64) -> Result<(), ServoError> {
        let duty = angle_to_duty(angle_degrees, &self.cfg);
        log::debug!("servo: {angle_degrees:.1}° (duty {duty:.2} %)");
        self.last_angle = Some(angle_degrees);
        Ok(())
    }

    fn home(&mut self) -> Result<(), ServoError> {
        log::info!("servo: homing (no hardware attached)");
        Ok(())
    }

    fn release(&mut self) -> Result<(), ServoError> {
        log::info!(
            "servo: released at {:.1}°",
            self.last_angle.unwrap_or(90.0)
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockServo (test double)
// ---------------------------------------------------------------------------

/// Test driver that records every call so tests can assert on the command
/// stream and the lifecycle order.
#[cfg(test)]
pub(crate) struct MockServo {
    pub commands: std::sync::Arc<std::sync::Mutex<Vec<f64>>>,
    pub homed: std::sync::Arc<std::sync::atomic::AtomicBool>,
    pub released: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MockServo {
    pub fn new() -> Self {
        Self {
            commands: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
            homed: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
            released: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Clone the observation handles before moving the mock into a loop.
    pub fn handles(
        &self,
    ) -> (
        std::sync::Arc<std::sync::Mutex<Vec<f64>>>,
        std::sync::Arc<std::sync::atomic::AtomicBool>,
        std::sync::Arc<std::sync::atomic::AtomicBool>,
    ) {
        (
            std::sync::Arc::clone(&self.commands),
            std::sync::Arc::clone(&self.homed),
            std::sync::Arc::clone(&self.released),
        )
    }
}

#[cfg(test)]
impl ServoDriver for MockServo {
    fn set_command(&mut self, angle_degrees: f64) -> Result<(), ServoError> {
        self.commands.lock().unwrap().push(angle_degrees);
        Ok(())
    }

    fn home(&mut self) -> Result<(), ServoError> {
        self.homed
            .store(true, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    fn release(&mut self) -> Result<(), ServoError> {
        self.released
            .store(true, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Endpoints and midpoint of the default duty range.
    #[test]
    fn duty_mapping_is_linear() {
        let cfg = ServoConfig::default();
        assert_eq!(angle_to_duty(0.0, &cfg), 2.5);
        assert_eq!(angle_to_duty(90.0, &cfg), 7.5);
        assert_eq!(angle_to_duty(180.0, &cfg), 12.5);
        assert_eq!(angle_to_duty(45.0, &cfg), 5.0);
    }

    /// Out-of-range angles are clamped before mapping.
    #[test]
    fn duty_mapping_clamps_input() {
        let cfg = ServoConfig::default();
        assert_eq!(angle_to_duty(-30.0, &cfg), 2.5);
        assert_eq!(angle_to_duty(500.0, &cfg), 12.5);
    }

    /// A non-default command range keeps the 90° midpoint property.
    #[test]
    fn duty_mapping_respects_custom_range() {
        let cfg = ServoConfig {
            min_duty_percent: 5.0,
            max_duty_percent: 10.0,
        };
        assert_eq!(angle_to_duty(90.0, &cfg), 7.5);
    }

    /// The null driver accepts the full lifecycle without error.
    #[test]
    fn null_servo_lifecycle() {
        let mut servo = NullServo::new(ServoConfig::default());
        servo.home().unwrap();
        servo.set_command(120.0).unwrap();
        servo.release().unwrap();
        assert_eq!(servo.last_angle, Some(120.0));
    }
}
