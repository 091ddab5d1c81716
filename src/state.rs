//! Shared motion state and system-level flags.
//!
//! [`MotionState`] is the single piece of mutable data the perception and
//! motor loops exchange: the perception loop writes `target_angle`, the
//! motor loop owns `current_angle`.  It is held behind [`SharedMotion`]
//! (`Arc<Mutex<MotionState>>`) — cheap to clone and safe to share across
//! tasks.  There is no queue between the two loops: target updates are
//! last-write-wins, because the motor loop re-samples the target every
//! tick and anything older than one tick is already stale.
//!
//! [`SystemFlags`] carries the run-mode booleans (tracking on/off, muted,
//! shutdown).  Each flag is an independent atomic; readers may observe a
//! change up to one loop iteration late, which is fine for mode toggles.
//!
//! Lock with `.lock().unwrap()` for a short critical section — a single
//! read or a single read-modify-write.  Do **not** hold the lock across an
//! `.await` point or a hardware call.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

/// Lowest commandable pan angle in degrees.
pub const ANGLE_MIN: f64 = 0.0;
/// Highest commandable pan angle in degrees.
pub const ANGLE_MAX: f64 = 180.0;

/// Clamp an angle to the servo's commandable range.
///
/// ```
/// use pan_tracker::state::clamp_angle;
///
/// assert_eq!(clamp_angle(-10.0), 0.0);
/// assert_eq!(clamp_angle(90.0), 90.0);
/// assert_eq!(clamp_angle(200.0), 180.0);
/// ```
pub fn clamp_angle(angle: f64) -> f64 {
    angle.clamp(ANGLE_MIN, ANGLE_MAX)
}

// ---------------------------------------------------------------------------
// MotionState
// ---------------------------------------------------------------------------

/// Pan axis position state shared between the perception and motor loops.
///
/// Invariant: both angles are always within `[0, 180]` — writers clamp
/// before storing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Where the servo actually is, in degrees.  Written only by the motor
    /// loop's tick.
    pub current_angle: f64,
    /// Where the servo should head, in degrees.  Written by the perception
    /// loop (and by the orchestrator for the shutdown home move).
    pub target_angle: f64,
}

impl MotionState {
    /// Create a state resting at `home` (current == target, no motion).
    pub fn at_home(home: f64) -> Self {
        let home = clamp_angle(home);
        Self {
            current_angle: home,
            target_angle: home,
        }
    }

    /// Remaining angular error in degrees (target − current).
    pub fn error(&self) -> f64 {
        self.target_angle - self.current_angle
    }
}

// ---------------------------------------------------------------------------
// SharedMotion
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`MotionState`].
pub type SharedMotion = Arc<Mutex<MotionState>>;

/// Construct a new [`SharedMotion`] resting at `home`.
pub fn new_shared_motion(home: f64) -> SharedMotion {
    Arc::new(Mutex::new(MotionState::at_home(home)))
}

// ---------------------------------------------------------------------------
// SystemFlags
// ---------------------------------------------------------------------------

/// Run-mode flags shared by every task.
///
/// * `tracking_enabled` — perception publishes targets only while set.
/// * `muted` — the command dispatcher honors only the unmute phrase.
/// * `shutdown_requested` — set once, never cleared; every loop exits at
///   its next iteration boundary after observing it.
#[derive(Debug)]
pub struct SystemFlags {
    tracking_enabled: AtomicBool,
    muted: AtomicBool,
    shutdown_requested: AtomicBool,
}

impl SystemFlags {
    /// Flags with the startup defaults: tracking on, not muted, running.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tracking_enabled: AtomicBool::new(true),
            muted: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
        })
    }

    /// Whether the perception loop should publish targets.
    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable tracking.
    pub fn set_tracking(&self, enabled: bool) {
        self.tracking_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether voice commands other than unmute are ignored.
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Mute or unmute command processing.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Whether shutdown has been requested.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Relaxed)
    }

    /// Request shutdown.  One-way: there is no way to clear this.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- clamp_angle ---

    #[test]
    fn clamp_angle_bounds() {
        assert_eq!(clamp_angle(-5.0), 0.0);
        assert_eq!(clamp_angle(0.0), 0.0);
        assert_eq!(clamp_angle(90.0), 90.0);
        assert_eq!(clamp_angle(180.0), 180.0);
        assert_eq!(clamp_angle(300.0), 180.0);
    }

    // ---- MotionState ---

    #[test]
    fn at_home_rests_with_no_error() {
        let state = MotionState::at_home(90.0);
        assert_eq!(state.current_angle, 90.0);
        assert_eq!(state.target_angle, 90.0);
        assert_eq!(state.error(), 0.0);
    }

    #[test]
    fn at_home_clamps_out_of_range_home() {
        let state = MotionState::at_home(250.0);
        assert_eq!(state.current_angle, 180.0);
        assert_eq!(state.target_angle, 180.0);
    }

    #[test]
    fn error_is_signed() {
        let mut state = MotionState::at_home(90.0);
        state.target_angle = 120.0;
        assert_eq!(state.error(), 30.0);
        state.target_angle = 60.0;
        assert_eq!(state.error(), -30.0);
    }

    #[test]
    fn shared_motion_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedMotion>();
    }

    #[test]
    fn shared_motion_can_be_cloned_and_mutated() {
        let motion = new_shared_motion(90.0);
        let motion2 = Arc::clone(&motion);

        motion.lock().unwrap().target_angle = 45.0;
        assert_eq!(motion2.lock().unwrap().target_angle, 45.0);
    }

    // ---- SystemFlags ---

    #[test]
    fn flags_default_to_tracking_unmuted_running() {
        let flags = SystemFlags::new();
        assert!(flags.tracking_enabled());
        assert!(!flags.is_muted());
        assert!(!flags.shutdown_requested());
    }

    #[test]
    fn flags_toggle_independently() {
        let flags = SystemFlags::new();

        flags.set_tracking(false);
        flags.set_muted(true);
        assert!(!flags.tracking_enabled());
        assert!(flags.is_muted());

        flags.set_tracking(true);
        flags.set_muted(false);
        assert!(flags.tracking_enabled());
        assert!(!flags.is_muted());
    }

    #[test]
    fn shutdown_is_monotonic() {
        let flags = SystemFlags::new();
        flags.request_shutdown();
        assert!(flags.shutdown_requested());

        // Toggling the other flags must not touch it.
        flags.set_tracking(false);
        flags.set_muted(true);
        assert!(flags.shutdown_requested());
    }
}
