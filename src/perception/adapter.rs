//! Perception adapter — detector polls → filtered signal → shared target.
//!
//! [`PerceptionAdapter`] is the variable-rate unit: its loop rate is
//! whatever the detector delivers (typically 10–60 Hz).  Each iteration it
//! polls the detector on the blocking thread pool, runs the offset through
//! the EMA filter and target mapper, and publishes the new target angle
//! into [`SharedMotion`] under one short lock.  There is no handshake with
//! the motor loop — targets are last-write-wins.
//!
//! # Flag handling
//!
//! * `tracking_enabled == false` — the detector is not polled; the filter
//!   and controller are reset so re-enabling starts clean.
//! * `shutdown_requested` — the loop exits at the next iteration boundary.
//!
//! # Target loss
//!
//! A tick with no (confident enough) detection resets the filter and the
//! full controller state; a stale average or derivative from the previous
//! acquisition must not flavor the next one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PerceptionConfig;
use crate::control::{OffsetFilter, TargetMapper};
use crate::perception::detector::{Detection, Detector};
use crate::state::{SharedMotion, SystemFlags};

// ---------------------------------------------------------------------------
// PerceptionAdapter
// ---------------------------------------------------------------------------

/// Variable-rate task feeding targets to the motor loop.
pub struct PerceptionAdapter {
    detector: Arc<dyn Detector>,
    filter: OffsetFilter,
    mapper: TargetMapper,
    motion: SharedMotion,
    flags: Arc<SystemFlags>,
    cfg: PerceptionConfig,
}

impl PerceptionAdapter {
    /// Wire an adapter to its collaborators.
    pub fn new(
        detector: Arc<dyn Detector>,
        filter: OffsetFilter,
        mapper: TargetMapper,
        motion: SharedMotion,
        flags: Arc<SystemFlags>,
        cfg: PerceptionConfig,
    ) -> Self {
        Self {
            detector,
            filter,
            mapper,
            motion,
            flags,
            cfg,
        }
    }

    /// Run until shutdown is requested.
    pub async fn run(mut self) {
        let idle_poll = Duration::from_millis(self.cfg.idle_poll_ms);
        let mut tracking_active = false;
        let mut last_map: Option<Instant> = None;

        let mut detections: u32 = 0;
        let mut rate_timer = Instant::now();

        log::info!("perception: adapter started");

        while !self.flags.shutdown_requested() {
            if !self.flags.tracking_enabled() {
                if tracking_active {
                    log::info!("perception: tracking disabled");
                    self.lose_target(&mut tracking_active, &mut last_map);
                }
                tokio::time::sleep(idle_poll).await;
                continue;
            }

            // poll() blocks for a frame; keep it off the async workers.
            let detector = Arc::clone(&self.detector);
            let detection = match tokio::task::spawn_blocking(move || detector.poll()).await {
                Ok(Ok(detection)) => detection,
                Ok(Err(e)) => {
                    log::warn!("perception: detector poll failed: {e}");
                    tokio::time::sleep(idle_poll).await;
                    continue;
                }
                Err(e) => {
                    log::error!("perception: detector task failed: {e}");
                    tokio::time::sleep(idle_poll).await;
                    continue;
                }
            };

            detections += 1;
            if rate_timer.elapsed() >= Duration::from_secs(3) {
                let rate = f64::from(detections) / rate_timer.elapsed().as_secs_f64();
                log::debug!("perception: detection rate {rate:.1} Hz");
                detections = 0;
                rate_timer = Instant::now();
            }

            match self.confident_offset(&detection) {
                Some(offset) => {
                    if !tracking_active {
                        let confidence = detection.confidence.unwrap_or(f32::NAN);
                        log::info!("perception: target acquired (confidence {confidence:.2})");
                        tracking_active = true;
                    }
                    self.publish(offset, &mut last_map);
                }
                None => {
                    if tracking_active {
                        log::info!("perception: target lost");
                    }
                    self.lose_target(&mut tracking_active, &mut last_map);
                }
            }
        }

        log::info!("perception: shutdown observed, adapter exiting");
    }

    /// The detection's offset, unless it is missing or below the
    /// confidence gate.
    fn confident_offset(&self, detection: &Detection) -> Option<i32> {
        let offset = detection.offset?;
        match detection.confidence {
            Some(c) if c < self.cfg.min_confidence => None,
            _ => Some(offset),
        }
    }

    /// Filter the offset and, when it is actionable, publish a new target
    /// angle under one read-modify-write lock.
    fn publish(&mut self, offset: i32, last_map: &mut Option<Instant>) {
        match self.filter.apply(offset) {
            Some(filtered) => {
                let dt = last_map
                    .map(|t| t.elapsed().as_secs_f64())
                    .unwrap_or(0.0);
                *last_map = Some(Instant::now());

                let motion = Arc::clone(&self.motion);
                let mut m = motion.lock().unwrap();
                let current = m.current_angle;
                let target = self.mapper.map(filtered, current, dt);
                m.target_angle = target;
                log::debug!("perception: offset {filtered:+.1} px → target {target:.1}°");
            }
            None => {
                // Inside the deadband: no motion, and the derivative must
                // not spike when motion resumes.
                self.mapper.reset_derivative();
            }
        }
    }

    /// Reset the signal chain after losing (or disabling) the target.
    fn lose_target(&mut self, tracking_active: &mut bool, last_map: &mut Option<Instant>) {
        *tracking_active = false;
        *last_map = None;
        self.filter.reset();
        self.mapper.reset();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, ControllerConfig};
    use crate::perception::detector::ScriptedDetector;
    use crate::state::new_shared_motion;

    fn make_adapter(
        script: Vec<Detection>,
        flags: Arc<SystemFlags>,
    ) -> (PerceptionAdapter, SharedMotion) {
        let motion = new_shared_motion(90.0);
        let adapter = PerceptionAdapter::new(
            Arc::new(ScriptedDetector::new(script)),
            OffsetFilter::new(1.0, 15.0), // passthrough EMA for determinism
            TargetMapper::from_config(&CameraConfig::default(), &ControllerConfig::default()),
            Arc::clone(&motion),
            flags,
            PerceptionConfig::default(),
        );
        (adapter, motion)
    }

    async fn run_briefly(adapter: PerceptionAdapter, flags: &Arc<SystemFlags>, ms: u64) {
        let task = tokio::spawn(adapter.run());
        tokio::time::sleep(Duration::from_millis(ms)).await;
        flags.request_shutdown();
        let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
    }

    /// A confident off-center detection moves the shared target.
    #[tokio::test]
    async fn confident_detection_publishes_target() {
        let flags = SystemFlags::new();
        let (adapter, motion) =
            make_adapter(vec![Detection::at(200, 0.9)], Arc::clone(&flags));

        run_briefly(adapter, &flags, 50).await;

        let target = motion.lock().unwrap().target_angle;
        assert!((target - 93.61).abs() < 0.05);
    }

    /// Offsets inside the deadband leave the target untouched.
    #[tokio::test]
    async fn deadband_detection_leaves_target_unchanged() {
        let flags = SystemFlags::new();
        let (adapter, motion) = make_adapter(vec![Detection::at(5, 0.9)], Arc::clone(&flags));

        run_briefly(adapter, &flags, 50).await;

        assert_eq!(motion.lock().unwrap().target_angle, 90.0);
    }

    /// Low-confidence detections are treated as "no person".
    #[tokio::test]
    async fn low_confidence_is_no_target() {
        let flags = SystemFlags::new();
        let (adapter, motion) =
            make_adapter(vec![Detection::at(200, 0.2)], Arc::clone(&flags));

        run_briefly(adapter, &flags, 50).await;

        assert_eq!(motion.lock().unwrap().target_angle, 90.0);
    }

    /// Detections with no confidence value pass the gate.
    #[tokio::test]
    async fn missing_confidence_passes_gate() {
        let flags = SystemFlags::new();
        let detection = Detection {
            offset: Some(200),
            confidence: None,
        };
        let (adapter, motion) = make_adapter(vec![detection], Arc::clone(&flags));

        run_briefly(adapter, &flags, 50).await;

        assert!(motion.lock().unwrap().target_angle > 90.0);
    }

    /// While tracking is disabled the detector is never polled and the
    /// target never moves.
    #[tokio::test]
    async fn disabled_tracking_publishes_nothing() {
        let flags = SystemFlags::new();
        flags.set_tracking(false);
        let (adapter, motion) =
            make_adapter(vec![Detection::at(300, 0.99); 50], Arc::clone(&flags));

        run_briefly(adapter, &flags, 80).await;

        assert_eq!(motion.lock().unwrap().target_angle, 90.0);
    }

    /// The adapter exits promptly once shutdown is requested.
    #[tokio::test]
    async fn adapter_exits_on_shutdown() {
        let flags = SystemFlags::new();
        let (adapter, _motion) = make_adapter(vec![], Arc::clone(&flags));

        let task = tokio::spawn(adapter.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        flags.request_shutdown();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("adapter must exit after shutdown")
            .expect("adapter must not panic");
    }
}
