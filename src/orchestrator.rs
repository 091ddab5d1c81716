//! Orchestrator — owns the concurrent units and the teardown order.
//!
//! # Startup sequence
//!
//! 1. Home the servo (blocking; a failure here aborts startup — the
//!    tracker never enters a control loop without a working actuator).
//! 2. Start the motor loop so the pan axis is live.
//! 3. Spawn the perception adapter — only now can targets start flowing.
//! 4. Spawn the voice loop.
//!
//! # Shutdown sequence
//!
//! Triggered by `SystemFlags::request_shutdown` (Ctrl-C in the binary).
//! Total-ordered and best-effort — every step is attempted even when an
//! earlier one failed or timed out:
//!
//! 1. Join the perception adapter (bounded) — no new targets.
//! 2. Set the target to home and wait for the motor loop's own
//!    interpolation to settle there (bounded) — no instantaneous jump.
//! 3. Stop and join the motor loop (bounded), recovering the driver.
//! 4. Release the servo hardware.
//! 5. Join the voice loop (bounded; its blocking audio read may hold it
//!    past the deadline, in which case it is abandoned).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::control::{OffsetFilter, TargetMapper};
use crate::motor::{MotorLoop, ServoDriver};
use crate::perception::{Detector, PerceptionAdapter};
use crate::state::{new_shared_motion, SharedMotion, SystemFlags};
use crate::voice::{CommandDispatcher, ResponseSink, SoundPlayer, SpeechPipeline, VoiceLoop};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The external boundaries the orchestrator wires together.
///
/// The binary fills these with the hardware backends of the deployment
/// (or the no-hardware stand-ins); tests fill them with doubles.
pub struct Collaborators {
    /// Pan servo.
    pub servo: Box<dyn ServoDriver>,
    /// Person detector.
    pub detector: Arc<dyn Detector>,
    /// Wake-and-record speech episodes.
    pub speech: Arc<dyn SpeechPipeline>,
    /// Sound-effect playback.
    pub player: Arc<dyn SoundPlayer>,
    /// Receiver for non-command utterances.
    pub response: Arc<dyn ResponseSink>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Builds the shared state, runs the three units, and tears them down in
/// order.
pub struct Orchestrator {
    config: AppConfig,
    motion: SharedMotion,
    flags: Arc<SystemFlags>,
}

impl Orchestrator {
    /// Create an orchestrator with fresh state resting at the configured
    /// home angle.
    pub fn new(config: AppConfig) -> Self {
        let motion = new_shared_motion(config.actuation.home_angle);
        Self {
            config,
            motion,
            flags: SystemFlags::new(),
        }
    }

    /// Handle to the shared flags (for signal wiring and tests).
    pub fn flags(&self) -> Arc<SystemFlags> {
        Arc::clone(&self.flags)
    }

    /// Handle to the shared motion state (for tests and diagnostics).
    pub fn motion(&self) -> SharedMotion {
        Arc::clone(&self.motion)
    }

    /// Run the tracker until shutdown is requested, then tear down.
    ///
    /// # Errors
    ///
    /// Only startup failures (the servo refusing to home) are returned;
    /// everything after the loops are live is handled internally.
    pub async fn run(self, collab: Collaborators) -> Result<()> {
        let Collaborators {
            mut servo,
            detector,
            speech,
            player,
            response,
        } = collab;

        // -- Startup: actuator first, then the loops that feed it -------
        servo
            .home()
            .context("failed to home the servo during startup")?;
        log::info!(
            "orchestrator: servo homed at {:.1}°",
            self.config.actuation.home_angle
        );

        let motor = MotorLoop::new(
            Arc::clone(&self.motion),
            servo,
            self.config.actuation.clone(),
        );
        let motor_stop = motor.stop_flag();
        let motor_task = tokio::spawn(motor.run());

        let adapter = PerceptionAdapter::new(
            detector,
            OffsetFilter::new(
                self.config.filter.ema_alpha,
                self.config.filter.deadband_pixels,
            ),
            TargetMapper::from_config(&self.config.camera, &self.config.controller),
            Arc::clone(&self.motion),
            Arc::clone(&self.flags),
            self.config.perception.clone(),
        );
        let perception_task = tokio::spawn(adapter.run());

        let voice = VoiceLoop::new(
            speech,
            CommandDispatcher::new(&self.config.voice),
            player,
            response,
            Arc::clone(&self.flags),
            Duration::from_secs_f64(self.config.voice.wake_cooldown_secs),
        );
        let voice_task = tokio::spawn(voice.run());

        log::info!("orchestrator: all units running");

        // -- Idle until someone asks us to stop -------------------------
        while !self.flags.shutdown_requested() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        self.shutdown(motor_stop, motor_task, perception_task, voice_task)
            .await;
        Ok(())
    }

    /// The teardown sequence.  Every step runs regardless of what the
    /// previous steps managed to do.
    async fn shutdown(
        &self,
        motor_stop: Arc<std::sync::atomic::AtomicBool>,
        motor_task: JoinHandle<Box<dyn ServoDriver>>,
        perception_task: JoinHandle<()>,
        voice_task: JoinHandle<()>,
    ) {
        let join_timeout = Duration::from_secs_f64(self.config.shutdown.join_timeout_secs);
        log::info!("orchestrator: shutting down");

        // 1. No new targets.
        join_with_timeout("perception", perception_task, join_timeout).await;

        // 2. Ride the interpolator back to home.
        self.return_home().await;

        // 3. Stop the motor loop and recover the driver.
        motor_stop.store(false, Ordering::Relaxed);
        let driver = join_with_timeout("motor", motor_task, join_timeout).await;

        // 4. Release the hardware.
        match driver {
            Some(mut driver) => {
                if let Err(e) = driver.release() {
                    log::warn!("orchestrator: servo release failed: {e}");
                }
            }
            None => log::warn!("orchestrator: motor loop kept the driver, skipping release"),
        }

        // 5. The voice loop may be stuck in a blocking read; don't wait
        //    forever for it.
        join_with_timeout("voice", voice_task, join_timeout).await;

        log::info!("orchestrator: shutdown complete");
    }

    /// Point the target at home and wait for the motor loop to settle
    /// there, bounded by the configured timeout.
    async fn return_home(&self) {
        let home = self.config.actuation.home_angle;
        let tolerance = self.config.shutdown.home_tolerance_degrees;
        let deadline =
            Instant::now() + Duration::from_secs_f64(self.config.shutdown.home_timeout_secs);

        self.motion.lock().unwrap().target_angle = home;

        loop {
            let current = self.motion.lock().unwrap().current_angle;
            if (current - home).abs() <= tolerance {
                log::info!("orchestrator: settled at home ({current:.1}°)");
                return;
            }
            if Instant::now() >= deadline {
                log::warn!(
                    "orchestrator: home move timed out at {current:.1}°, proceeding anyway"
                );
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

// ---------------------------------------------------------------------------
// join_with_timeout
// ---------------------------------------------------------------------------

/// Await `handle` for at most `timeout`; log and move on when the task
/// panicked or missed the deadline.
async fn join_with_timeout<T>(
    name: &str,
    handle: JoinHandle<T>,
    timeout: Duration,
) -> Option<T> {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            log::warn!("orchestrator: {name} task failed: {e}");
            None
        }
        Err(_) => {
            log::warn!("orchestrator: {name} task missed the {timeout:?} stop deadline");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::driver::{MockServo, ServoError};
    use crate::perception::detector::{Detection, ScriptedDetector};
    use crate::voice::response::NullResponse;
    use crate::voice::sound::LogPlayer;
    use crate::voice::speech::NullSpeech;

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.voice.wake_cooldown_secs = 0.01;
        config.shutdown.join_timeout_secs = 1.0;
        config.shutdown.home_timeout_secs = 2.0;
        config
    }

    fn collaborators(servo: Box<dyn ServoDriver>, script: Vec<Detection>) -> Collaborators {
        Collaborators {
            servo,
            detector: Arc::new(ScriptedDetector::new(script)),
            speech: Arc::new(NullSpeech::new(0.02)),
            player: Arc::new(LogPlayer),
            response: Arc::new(NullResponse),
        }
    }

    /// A servo that refuses to home must abort startup.
    #[tokio::test]
    async fn failed_home_aborts_startup() {
        struct BrokenServo;
        impl ServoDriver for BrokenServo {
            fn set_command(&mut self, _: f64) -> Result<(), ServoError> {
                panic!("must never be commanded");
            }
            fn home(&mut self) -> Result<(), ServoError> {
                Err(ServoError::Init("pwm channel busy".into()))
            }
            fn release(&mut self) -> Result<(), ServoError> {
                Ok(())
            }
        }

        let orchestrator = Orchestrator::new(fast_config());
        let result = orchestrator
            .run(collaborators(Box::new(BrokenServo), vec![]))
            .await;
        assert!(result.is_err());
    }

    /// Full lifecycle: track an off-center person, then shut down
    /// mid-interpolation.  The pan must be back at home (via the
    /// interpolator, not a jump) before the servo is released.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_returns_home_before_release() {
        let servo = MockServo::new();
        let (commands, homed, released) = servo.handles();

        // A stream of strongly off-center detections pulls the pan away
        // from home.
        let script = vec![Detection::at(320, 0.95); 100];
        let orchestrator = Orchestrator::new(fast_config());
        let flags = orchestrator.flags();
        let motion = orchestrator.motion();

        let run = tokio::spawn(orchestrator.run(collaborators(Box::new(servo), script)));

        // Let it actually move off home.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(homed.load(Ordering::Relaxed));
        let mid_angle = motion.lock().unwrap().current_angle;
        assert!(mid_angle > 90.0, "pan should have moved off home");

        flags.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("orchestrator must finish")
            .expect("orchestrator task must not panic")
            .expect("run must succeed");

        // Back at home within tolerance, hardware released.
        let final_angle = motion.lock().unwrap().current_angle;
        assert!((final_angle - 90.0).abs() <= 0.5);
        assert!(released.load(Ordering::Relaxed));

        // The return leg was interpolated: no two consecutive commands
        // differ by more than one tick at full speed.
        let cmds = commands.lock().unwrap();
        assert!(!cmds.is_empty());
        for pair in cmds.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= 150.0 * 0.01 + 1e-6);
        }
    }

    /// Shutdown with everything already at rest completes promptly and
    /// still releases the hardware.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn quiescent_shutdown_is_prompt() {
        let servo = MockServo::new();
        let (_, _, released) = servo.handles();

        let orchestrator = Orchestrator::new(fast_config());
        let flags = orchestrator.flags();

        let run = tokio::spawn(orchestrator.run(collaborators(Box::new(servo), vec![])));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        flags.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("orchestrator must finish")
            .expect("orchestrator task must not panic")
            .expect("run must succeed");

        assert!(released.load(Ordering::Relaxed));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
