//! Tracker settings structs, defaults and TOML persistence.
//!
//! Every tuning that has ever been touched on real hardware (gains,
//! deadband, smoothing factors, tick rate) lives here rather than as a
//! constant in the control code, so a deployment can be re-tuned without a
//! rebuild.  All structs implement `Serialize`, `Deserialize`, `Default`
//! and `Clone` so they can be round-tripped through TOML files and shared
//! across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// CameraConfig
// ---------------------------------------------------------------------------

/// Optical geometry of the camera feeding the detector.
///
/// The pixel→degree conversion used by the target mapper is derived from
/// these two values; nothing else in the control code knows about the
/// camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Horizontal field of view in degrees.
    pub fov_degrees: f64,
    /// Horizontal frame resolution in pixels.
    pub frame_width: u32,
}

impl CameraConfig {
    /// Pixels of horizontal offset per degree of pan angle.
    ///
    /// ```
    /// use pan_tracker::config::CameraConfig;
    ///
    /// let cam = CameraConfig::default(); // 640 px / 77°
    /// assert!((cam.pixels_per_degree() - 8.31).abs() < 0.01);
    /// ```
    pub fn pixels_per_degree(&self) -> f64 {
        f64::from(self.frame_width) / self.fov_degrees
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 77.0,
            frame_width: 640,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterConfig
// ---------------------------------------------------------------------------

/// Input-side smoothing applied to raw detector offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// EMA smoothing factor in `(0, 1]`.  Lower = smoother but more lag.
    pub ema_alpha: f64,
    /// Offsets whose smoothed magnitude is below this many pixels are
    /// treated as "already centered" and produce no motion.
    pub deadband_pixels: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.2,
            deadband_pixels: 15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// Which feedback controller converts angle error into a target change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerKind {
    /// Proportional-only — stateless and predictable.
    Proportional,
    /// Full PID with integral anti-windup and a low-pass-filtered
    /// derivative term.
    Pid,
}

impl Default for ControllerKind {
    fn default() -> Self {
        Self::Proportional
    }
}

/// Gains and limits for the target-mapper controller.
///
/// The historical tunings varied between deployments; the values here are
/// starting points, not gospel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller variant selected at startup.
    pub kind: ControllerKind,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (PID only).
    pub ki: f64,
    /// Derivative gain (PID only).
    pub kd: f64,
    /// EMA factor applied to the raw derivative before it is multiplied by
    /// `kd` (PID only).  Lower = smoother derivative, more lag.
    pub derivative_smoothing: f64,
    /// Clamp on the accumulated integral term, in degrees (PID only).
    pub integral_limit: f64,
    /// Maximum change the controller may request per update, in degrees.
    pub max_step_degrees: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kind: ControllerKind::default(),
            kp: 0.15,
            ki: 0.0,
            kd: 0.008,
            derivative_smoothing: 0.7,
            integral_limit: 10.0,
            max_step_degrees: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ActuationConfig
// ---------------------------------------------------------------------------

/// Fixed-rate motor interpolation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuationConfig {
    /// Control loop frequency in Hz.
    pub tick_hz: u32,
    /// Maximum angular velocity in degrees per second.
    pub max_speed_deg_per_sec: f64,
    /// Scale of the tanh S-curve; higher = gentler acceleration around the
    /// target.
    pub sigmoid_scale: f64,
    /// Steps below this angular rate (degrees per second) are not sent to
    /// the servo, suppressing redundant writes when already converged.
    pub min_movement_deg_per_sec: f64,
    /// Resting/startup pan angle in degrees.
    pub home_angle: f64,
}

impl ActuationConfig {
    /// Tick period implied by `tick_hz`.
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.tick_hz))
    }
}

impl Default for ActuationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 100,
            max_speed_deg_per_sec: 150.0,
            sigmoid_scale: 10.0,
            min_movement_deg_per_sec: 0.1,
            home_angle: 90.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ServoConfig
// ---------------------------------------------------------------------------

/// Servo command range.
///
/// A standard hobby servo at 50 Hz maps 2.5 % duty to 0° and 12.5 % duty
/// to 180°, with 7.5 % at the 90° midpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Duty-cycle percentage commanded at 0°.
    pub min_duty_percent: f64,
    /// Duty-cycle percentage commanded at 180°.
    pub max_duty_percent: f64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_duty_percent: 2.5,
            max_duty_percent: 12.5,
        }
    }
}

// ---------------------------------------------------------------------------
// PerceptionConfig
// ---------------------------------------------------------------------------

/// Perception loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Detections with a reported confidence below this are treated as
    /// "no target visible".  Detections with no confidence value pass.
    pub min_confidence: f32,
    /// Poll interval in milliseconds while tracking is disabled or after a
    /// detector error.
    pub idle_poll_ms: u64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            idle_poll_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Voice command vocabulary and episode pacing.
///
/// Matching is case-insensitive substring containment, so `"please stop
/// tracking now"` triggers the stop-tracking command with the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Seconds to ignore further wake episodes after a command was heard.
    pub wake_cooldown_secs: f64,
    /// Phrase that mutes command processing.
    pub mute_phrase: String,
    /// Phrase that unmutes command processing.  The only phrase honored
    /// while muted.
    pub unmute_phrase: String,
    /// Phrase that enables person tracking.
    pub enable_tracking_phrase: String,
    /// Phrase that disables person tracking.
    pub disable_tracking_phrase: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            wake_cooldown_secs: 5.0,
            mute_phrase: "mute".into(),
            unmute_phrase: "unmute".into(),
            enable_tracking_phrase: "start tracking".into(),
            disable_tracking_phrase: "stop tracking".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ShutdownConfig
// ---------------------------------------------------------------------------

/// Teardown pacing.  All joins are best-effort: a task that misses its
/// deadline is logged and left behind, never waited on forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Seconds to wait for each subordinate task to exit.
    pub join_timeout_secs: f64,
    /// Seconds to wait for the interpolated return-to-home move.
    pub home_timeout_secs: f64,
    /// The home move counts as settled once the pan angle is within this
    /// many degrees of home.
    pub home_tolerance_degrees: f64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            join_timeout_secs: 2.0,
            home_timeout_secs: 5.0,
            home_tolerance_degrees: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level tracker configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use pan_tracker::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Camera geometry.
    pub camera: CameraConfig,
    /// Offset smoothing and deadband.
    pub filter: FilterConfig,
    /// Target-mapper controller gains.
    pub controller: ControllerConfig,
    /// Motor interpolation loop.
    pub actuation: ActuationConfig,
    /// Servo command range.
    pub servo: ServoConfig,
    /// Perception loop.
    pub perception: PerceptionConfig,
    /// Voice command vocabulary.
    pub voice: VoiceConfig,
    /// Teardown pacing.
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests and `--config`).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
