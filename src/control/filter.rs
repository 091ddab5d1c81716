//! Offset smoothing — EMA filter with a deadband.
//!
//! Raw detector offsets are noisy: bounding boxes jump a handful of pixels
//! frame to frame even when nobody moves.  [`OffsetFilter`] smooths the
//! signal with an exponential moving average and then drops anything still
//! inside the deadband, so camera noise never turns into servo chatter.
//!
//! ## Algorithm
//!
//! `ema ← α·raw + (1−α)·ema` with configurable `α` (lower = smoother,
//! more lag).  When `|ema|` is below the deadband the sample is reported
//! as [`None`] — the caller must treat that as "no actionable offset" and
//! reset any derivative memory in its controller, otherwise the derivative
//! spikes when motion resumes.

// ---------------------------------------------------------------------------
// OffsetFilter
// ---------------------------------------------------------------------------

/// EMA smoother + deadband for raw pixel offsets.
///
/// # Example
///
/// ```rust
/// use pan_tracker::control::OffsetFilter;
///
/// // α = 1.0 disables smoothing; 15 px deadband
/// let mut filter = OffsetFilter::new(1.0, 15.0);
///
/// assert_eq!(filter.apply(5), None);          // inside the deadband
/// assert_eq!(filter.apply(200), Some(200.0)); // actionable offset
/// ```
#[derive(Debug, Clone)]
pub struct OffsetFilter {
    /// EMA smoothing factor in `(0, 1]`.
    alpha: f64,
    /// Smoothed offsets below this magnitude produce `None`.
    deadband_pixels: f64,
    /// Running smoothed offset in pixels.
    ema: f64,
}

impl OffsetFilter {
    /// Create a filter with the given smoothing factor and deadband.
    pub fn new(alpha: f64, deadband_pixels: f64) -> Self {
        Self {
            alpha,
            deadband_pixels,
            ema: 0.0,
        }
    }

    /// Feed one raw offset sample; returns the smoothed offset, or `None`
    /// when it is inside the deadband.
    ///
    /// On `None` the caller must reset its controller's derivative memory
    /// (see [`crate::control::Controller::reset_derivative`]).
    pub fn apply(&mut self, raw_offset: i32) -> Option<f64> {
        self.ema = self.alpha * f64::from(raw_offset) + (1.0 - self.alpha) * self.ema;

        if self.ema.abs() < self.deadband_pixels {
            None
        } else {
            Some(self.ema)
        }
    }

    /// Clear the smoothing state (used when the target is lost, so a stale
    /// average cannot bias the next acquisition).
    pub fn reset(&mut self) {
        self.ema = 0.0;
    }

    /// Current smoothed offset in pixels.
    pub fn ema(&self) -> f64 {
        self.ema
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
