//! Fixed-rate motor interpolation loop.
//!
//! # Overview
//!
//! [`MotorLoop`] is the only writer of `current_angle`.  It runs at a
//! fixed tick rate (100 Hz by default) and each tick moves the current
//! angle one bounded step along an S-curve toward the shared target:
//!
//! ```text
//! smooth = tanh(error / sigmoid_scale)     // −1 … +1
//! step   = smooth · max_speed · dt         // slow start, fast middle,
//!                                          // slow settle
//! ```
//!
//! The tanh saturates for large errors, so the angular velocity never
//! exceeds `max_speed_deg_per_sec` no matter how far away the target is.
//! Steps below `min_movement_deg_per_sec · dt` are not written to the
//! servo at all — a converged loop is completely quiet on the PWM line.
//!
//! The tick driver sleeps the remainder of each period and skips (never
//! replays) ticks lost to overruns, so a slow tick cannot cause a burst
//! of catch-up motion.
//!
//! # Shutdown
//!
//! The loop intentionally does **not** watch the global shutdown flag: the
//! orchestrator needs it alive after shutdown is requested to drive the
//! interpolated return-to-home move.  It runs until [`MotorLoop::stop_flag`]
//! is cleared, then hands its driver back for release.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::config::ActuationConfig;
use crate::motor::driver::ServoDriver;
use crate::state::{clamp_angle, SharedMotion};

// ---------------------------------------------------------------------------
// TickState
// ---------------------------------------------------------------------------

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    /// Already at (or indistinguishably close to) the target — no servo
    /// write was issued.
    Idle,
    /// A step was applied and commanded to the servo.
    Interpolating,
}

// ---------------------------------------------------------------------------
// MotorLoop
// ---------------------------------------------------------------------------

/// Owns the servo driver and interpolates `current_angle` toward
/// `target_angle` at a fixed rate.
pub struct MotorLoop {
    motion: SharedMotion,
    driver: Box<dyn ServoDriver>,
    cfg: ActuationConfig,
    running: Arc<AtomicBool>,
}

impl MotorLoop {
    /// Create a loop over `motion` driving `driver`.
    ///
    /// The loop assumes `motion` already rests at the home position (see
    /// [`crate::state::new_shared_motion`]); it does not command the servo
    /// until the target moves.
    pub fn new(motion: SharedMotion, driver: Box<dyn ServoDriver>, cfg: ActuationConfig) -> Self {
        Self {
            motion,
            driver,
            cfg,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stop flag for this loop.  Clear it to make [`run`](Self::run)
    /// return after the current tick.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Execute one interpolation step with tick period `dt` (seconds).
    ///
    /// Reads target and current under the lock, applies at most one
    /// bounded step, and issues the servo command only when the step is
    /// worth moving for.  The servo write happens after the lock is
    /// dropped.
    pub fn tick(&mut self, dt: f64) -> TickState {
        let new_angle = {
            let mut m = self.motion.lock().unwrap();
            let error = m.target_angle - m.current_angle;

            let smooth = (error / self.cfg.sigmoid_scale).tanh();
            let mut step = smooth * self.cfg.max_speed_deg_per_sec * dt;

            if step.abs() <= self.cfg.min_movement_deg_per_sec * dt {
                return TickState::Idle;
            }

            // Never step past the target, so convergence is monotonic.
            if step.abs() > error.abs() {
                step = error;
            }

            m.current_angle = clamp_angle(m.current_angle + step);
            m.current_angle
        };

        if let Err(e) = self.driver.set_command(new_angle) {
            log::warn!("motor: servo command failed: {e}");
        }

        TickState::Interpolating
    }

    /// Run until the stop flag is cleared, then return the driver so the
    /// caller can release the hardware.
    pub async fn run(mut self) -> Box<dyn ServoDriver> {
        let period = self.cfg.tick_period();
        let dt = period.as_secs_f64();

        let mut cadence = tokio::time::interval(period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("motor: control loop started ({} Hz)", self.cfg.tick_hz);

        let mut tick_count: u32 = 0;
        let mut rate_timer = Instant::now();

        while self.running.load(Ordering::Relaxed) {
            cadence.tick().await;
            self.tick(dt);

            tick_count += 1;
            if rate_timer.elapsed() >= Duration::from_secs(3) {
                let rate = f64::from(tick_count) / rate_timer.elapsed().as_secs_f64();
                log::debug!("motor: loop rate {rate:.1} Hz");
                tick_count = 0;
                rate_timer = Instant::now();
            }
        }

        let angle = self.motion.lock().unwrap().current_angle;
        log::info!("motor: control loop stopped at {angle:.1}°");
        self.driver
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::driver::MockServo;
    use crate::state::new_shared_motion;

    const DT: f64 = 0.01; // 100 Hz

    fn make_loop(home: f64) -> (MotorLoop, std::sync::Arc<std::sync::Mutex<Vec<f64>>>) {
        let servo = MockServo::new();
        let (commands, _, _) = servo.handles();
        let motion = new_shared_motion(home);
        let ml = MotorLoop::new(motion, Box::new(servo), ActuationConfig::default());
        (ml, commands)
    }

    fn set_target(ml: &MotorLoop, target: f64) {
        ml.motion.lock().unwrap().target_angle = target;
    }

    fn current(ml: &MotorLoop) -> f64 {
        ml.motion.lock().unwrap().current_angle
    }

    /// Steady state issues no servo writes at all.
    #[test]
    fn converged_loop_is_idle_and_quiet() {
        let (mut ml, commands) = make_loop(90.0);

        for _ in 0..50 {
            assert_eq!(ml.tick(DT), TickState::Idle);
        }
        assert!(commands.lock().unwrap().is_empty());
    }

    /// One tick never moves faster than the speed cap.
    #[test]
    fn step_respects_speed_cap() {
        let (mut ml, _) = make_loop(90.0);
        set_target(&ml, 180.0);

        let before = current(&ml);
        ml.tick(DT);
        let after = current(&ml);

        let max_step = ActuationConfig::default().max_speed_deg_per_sec * DT;
        assert!((after - before).abs() <= max_step + 1e-9);
        assert!(after > before);
    }

    /// Repeated ticks strictly shrink the error with no overshoot, and the
    /// loop goes quiet once converged.
    #[test]
    fn interpolation_converges_monotonically() {
        let (mut ml, _) = make_loop(60.0);
        set_target(&ml, 90.0);

        let mut last_error = 30.0_f64;
        let mut settled = false;
        for _ in 0..2_000 {
            let state = ml.tick(DT);
            let error = (90.0 - current(&ml)).abs();
            assert!(error <= last_error + 1e-12, "error must never grow");
            last_error = error;
            if state == TickState::Idle {
                settled = true;
                break;
            }
        }
        assert!(settled, "loop must settle within 20 s of simulated time");
        assert!(last_error < 0.1);
    }

    /// The angle stays within the commandable range even when the target
    /// sits on a bound.
    #[test]
    fn angle_stays_in_range() {
        let (mut ml, _) = make_loop(175.0);
        set_target(&ml, 180.0);

        for _ in 0..500 {
            ml.tick(DT);
            let angle = current(&ml);
            assert!((0.0..=180.0).contains(&angle));
        }
    }

    /// Large errors saturate the S-curve: the first step from 0° to 180°
    /// runs at (almost exactly) full speed.
    #[test]
    fn large_error_saturates_to_max_speed() {
        let (mut ml, _) = make_loop(0.0);
        set_target(&ml, 180.0);

        let before = current(&ml);
        ml.tick(DT);
        let step = current(&ml) - before;

        let full_step = ActuationConfig::default().max_speed_deg_per_sec * DT;
        assert!(step > full_step * 0.99);
    }

    /// Every tick that moves also issues exactly one servo write, with the
    /// new angle.
    #[test]
    fn each_moving_tick_commands_the_servo_once() {
        let (mut ml, commands) = make_loop(90.0);
        set_target(&ml, 100.0);

        ml.tick(DT);
        ml.tick(DT);

        let cmds = commands.lock().unwrap();
        assert_eq!(cmds.len(), 2);
        assert!((cmds[1] - current(&ml)).abs() < 1e-9);
    }

    /// A target update mid-flight redirects the interpolation.
    #[test]
    fn target_update_redirects_interpolation() {
        let (mut ml, _) = make_loop(90.0);
        set_target(&ml, 120.0);

        for _ in 0..20 {
            ml.tick(DT);
        }
        let mid = current(&ml);
        assert!(mid > 90.0);

        set_target(&ml, 80.0);
        for _ in 0..200 {
            ml.tick(DT);
        }
        assert!(current(&ml) < mid);
    }

    /// `run` exits when the stop flag is cleared and hands back the driver.
    #[tokio::test]
    async fn run_stops_on_flag_and_returns_driver() {
        let servo = MockServo::new();
        let (commands, _, _) = servo.handles();
        let motion = new_shared_motion(90.0);
        let mut cfg = ActuationConfig::default();
        cfg.tick_hz = 200; // keep the test short

        let ml = MotorLoop::new(std::sync::Arc::clone(&motion), Box::new(servo), cfg);
        let stop = ml.stop_flag();
        motion.lock().unwrap().target_angle = 100.0;

        let task = tokio::spawn(ml.run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.store(false, Ordering::Relaxed);

        let driver = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop must stop promptly")
            .expect("loop must not panic");
        drop(driver);

        assert!(!commands.lock().unwrap().is_empty());
        let angle = motion.lock().unwrap().current_angle;
        assert!(angle > 90.0);
    }
}
