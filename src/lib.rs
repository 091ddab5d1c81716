//! Pan Tracker — motion-control core for a pan-axis person-tracking
//! camera robot with a voice command interface.
//!
//! Three independently-clocked units share two small pieces of state:
//!
//! ```text
//! ┌─────────────────────┐      ┌──────────────────────┐
//! │ Perception adapter  │      │ Voice loop           │
//! │ (detector rate,     │      │ (blocking wake/record│
//! │  10–60 Hz)          │      │  episodes)           │
//! └─────────┬───────────┘      └──────────┬───────────┘
//!           │ target_angle                │ flags
//!           ▼                             ▼
//!   ┌───────────────┐            ┌─────────────────┐
//!   │ MotionState   │            │ SystemFlags     │
//!   │ (Mutex)       │            │ (atomics)       │
//!   └───────┬───────┘            └────────┬────────┘
//!           │ current ⟵ target            │ read each iteration
//!           ▼                             │
//! ┌─────────────────────┐                 │
//! │ Motor loop (100 Hz, │◀────────────────┘
//! │ tanh S-curve)       │──▶ ServoDriver
//! └─────────────────────┘
//! ```
//!
//! The perception side turns noisy detector offsets into a bounded target
//! angle (EMA filter → deadband → proportional or PID controller); the
//! motor side chases the target at a fixed tick rate with an S-curve
//! velocity profile, so the servo moves smoothly no matter how bursty the
//! detector is.  Voice commands flip run-mode flags; shutdown is a
//! set-once flag every loop polls cooperatively, and the orchestrator
//! owns the home-and-release teardown order.
//!
//! Hardware and inference (camera, detector model, microphone, wake word,
//! STT, speaker, PWM) all live behind traits — see [`perception::Detector`],
//! [`voice::SpeechPipeline`], [`voice::SoundPlayer`], [`voice::ResponseSink`]
//! and [`motor::ServoDriver`].

pub mod config;
pub mod control;
pub mod motor;
pub mod orchestrator;
pub mod perception;
pub mod state;
pub mod voice;
