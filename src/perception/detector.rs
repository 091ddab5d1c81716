//! Person detector boundary.
//!
//! # Overview
//!
//! [`Detector`] is the seam between the control core and the vision
//! stack.  One [`poll`](Detector::poll) per perception tick returns a
//! [`Detection`]: a signed horizontal pixel offset from frame center plus
//! an optional confidence, or nothing when no person is visible.  "No
//! person" is a normal value, not an error — the adapter treats it as a
//! quiet tick.
//!
//! Real backends (a camera plus an on-device or accelerator-hosted person
//! model) live behind this trait in the robot build.  [`NullDetector`] is
//! the no-hardware stand-in.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Result of one detector poll.
///
/// `offset` is the signed horizontal distance of the person's bounding-box
/// center from the frame center, in pixels (negative = left).  `None`
/// means no person was visible this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Signed pixel offset from frame center, if a person was seen.
    pub offset: Option<i32>,
    /// Detector confidence in `[0, 1]`, when the backend reports one.
    pub confidence: Option<f32>,
}

impl Detection {
    /// A tick with no person visible.
    pub fn none() -> Self {
        Self {
            offset: None,
            confidence: None,
        }
    }

    /// A person seen `offset` pixels from center with `confidence`.
    pub fn at(offset: i32, confidence: f32) -> Self {
        Self {
            offset: Some(offset),
            confidence: Some(confidence),
        }
    }
}

// ---------------------------------------------------------------------------
// DetectorError
// ---------------------------------------------------------------------------

/// Errors surfaced by detector implementations.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// The camera or model failed to initialise.  Fatal at startup.
    #[error("detector initialisation failed: {0}")]
    Init(String),

    /// A frame could not be captured or inferred on.  Transient: the
    /// adapter logs it and retries after a short pause.
    #[error("detector capture failed: {0}")]
    Capture(String),
}

// ---------------------------------------------------------------------------
// Detector trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the person detector.
///
/// `poll` blocks for one frame-capture-plus-inference cycle; the
/// perception adapter calls it through `spawn_blocking` so the async
/// runtime never stalls on it.  Implementations must be `Send + Sync` so
/// they can be held behind an `Arc<dyn Detector>`.
pub trait Detector: Send + Sync {
    /// Capture one frame, run detection, and report the result.
    fn poll(&self) -> Result<Detection, DetectorError>;
}

// ---------------------------------------------------------------------------
// NullDetector
// ---------------------------------------------------------------------------

/// Detector stand-in for machines without a camera.
///
/// Always reports "no person"; sleeps for one nominal frame period per
/// poll so the adapter loop is paced the way a real camera's frame wait
/// would pace it.
pub struct NullDetector {
    frame_period: std::time::Duration,
}

impl NullDetector {
    /// Create a stand-in pacing polls at `fps` frames per second.
    pub fn new(fps: u32) -> Self {
        Self {
            frame_period: std::time::Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
        }
    }
}

impl Detector for NullDetector {
    fn poll(&self) -> Result<Detection, DetectorError> {
        std::thread::sleep(self.frame_period);
        Ok(Detection::none())
    }
}

// ---------------------------------------------------------------------------
// ScriptedDetector (test double)
// ---------------------------------------------------------------------------

/// Test detector that replays a fixed sequence of detections, then keeps
/// reporting "no person".
#[cfg(test)]
pub(crate) struct ScriptedDetector {
    script: std::sync::Mutex<std::collections::VecDeque<Detection>>,
}

#[cfg(test)]
impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = Detection>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into_iter().collect()),
        }
    }
}

#[cfg(test)]
impl Detector for ScriptedDetector {
    fn poll(&self) -> Result<Detection, DetectorError> {
        // Pace like a fast camera so test loops do not spin.
        std::thread::sleep(std::time::Duration::from_millis(2));
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Detection::none))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_constructors() {
        let none = Detection::none();
        assert_eq!(none.offset, None);
        assert_eq!(none.confidence, None);

        let hit = Detection::at(-120, 0.87);
        assert_eq!(hit.offset, Some(-120));
        assert_eq!(hit.confidence, Some(0.87));
    }

    #[test]
    fn null_detector_reports_no_person() {
        let det = NullDetector::new(1_000);
        assert_eq!(det.poll().unwrap(), Detection::none());
    }

    #[test]
    fn scripted_detector_replays_then_goes_quiet() {
        let det = ScriptedDetector::new([Detection::at(10, 0.9), Detection::none()]);
        assert_eq!(det.poll().unwrap(), Detection::at(10, 0.9));
        assert_eq!(det.poll().unwrap(), Detection::none());
        assert_eq!(det.poll().unwrap(), Detection::none());
    }

    #[test]
    fn detector_trait_is_object_safe() {
        fn assert_obj(_: &dyn Detector) {}
        let det = NullDetector::new(30);
        assert_obj(&det);
    }
}
