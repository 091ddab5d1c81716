//! Speech pipeline boundary.
//!
//! One [`listen`](SpeechPipeline::listen) call is one complete
//! wake-and-record episode: block until the wake phrase fires (or an
//! internal listening window lapses), record the command that follows,
//! transcribe it, and hand back the text.  `Ok(None)` means "nothing was
//! said" — a normal outcome, not an error.
//!
//! The robot build implements this with a microphone stream, a wake-word
//! model and an STT engine; [`NullSpeech`] is the no-hardware stand-in.

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors surfaced by speech pipeline implementations.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// The audio input device failed to open.  Fatal at startup.
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// A recording or transcription attempt failed.  Transient: the voice
    /// loop logs it and listens again.
    #[error("speech episode failed: {0}")]
    Episode(String),
}

// ---------------------------------------------------------------------------
// SpeechPipeline trait
// ---------------------------------------------------------------------------

/// Blocking wake-and-record episodes.
///
/// `listen` may block for seconds at a time (it holds the microphone);
/// the voice loop calls it through `spawn_blocking`.  Implementations
/// must be `Send + Sync` so they can be held behind an
/// `Arc<dyn SpeechPipeline>`.
pub trait SpeechPipeline: Send + Sync {
    /// Run one wake-and-record episode.
    ///
    /// Returns `Ok(Some(text))` when a command was heard and transcribed,
    /// `Ok(None)` when the episode ended without usable speech.
    fn listen(&self) -> Result<Option<String>, SpeechError>;
}

// ---------------------------------------------------------------------------
// NullSpeech
// ---------------------------------------------------------------------------

/// Pipeline stand-in for machines without a microphone.
///
/// Sleeps for one listening window per episode and reports silence.
pub struct NullSpeech {
    window: std::time::Duration,
}

impl NullSpeech {
    /// Create a stand-in whose episodes last `window_secs` seconds.
    pub fn new(window_secs: f64) -> Self {
        Self {
            window: std::time::Duration::from_secs_f64(window_secs.max(0.01)),
        }
    }
}

impl SpeechPipeline for NullSpeech {
    fn listen(&self) -> Result<Option<String>, SpeechError> {
        std::thread::sleep(self.window);
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// ScriptedSpeech (test double)
// ---------------------------------------------------------------------------

/// Test pipeline that replays a fixed sequence of episodes, then reports
/// silence forever.
#[cfg(test)]
pub(crate) struct ScriptedSpeech {
    script: std::sync::Mutex<std::collections::VecDeque<Option<String>>>,
}

#[cfg(test)]
impl ScriptedSpeech {
    pub fn new(script: impl IntoIterator<Item = Option<String>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into_iter().collect()),
        }
    }
}

#[cfg(test)]
impl SpeechPipeline for ScriptedSpeech {
    fn listen(&self) -> Result<Option<String>, SpeechError> {
        std::thread::sleep(std::time::Duration::from_millis(2));
        Ok(self.script.lock().unwrap().pop_front().flatten())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_speech_reports_silence() {
        let speech = NullSpeech::new(0.01);
        assert_eq!(speech.listen().unwrap(), None);
    }

    #[test]
    fn scripted_speech_replays_then_goes_quiet() {
        let speech = ScriptedSpeech::new([Some("mute".to_string()), None]);
        assert_eq!(speech.listen().unwrap().as_deref(), Some("mute"));
        assert_eq!(speech.listen().unwrap(), None);
        assert_eq!(speech.listen().unwrap(), None);
    }
}
