//! Voice subsystem — wake episodes, command dispatch, and the boundaries
//! to the speech, sound and response collaborators.
//!
//! # Architecture
//!
//! ```text
//! SpeechPipeline::listen (blocking wake-and-record episode)
//!     └─▶ VoiceLoop
//!           ├─ CommandDispatcher ──▶ SystemFlags   (+ SoundPlayer ack)
//!           └─ unhandled text ─────▶ ResponseSink  (emotion/reply path)
//! ```

pub mod command;
pub mod response;
pub mod session;
pub mod sound;
pub mod speech;

pub use command::{Command, CommandDispatcher};
pub use response::{NullResponse, ResponseSink};
pub use session::VoiceLoop;
pub use sound::{LogPlayer, SoundEffect, SoundPlayer};
pub use speech::{NullSpeech, SpeechError, SpeechPipeline};
