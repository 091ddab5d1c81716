//! Sound-effect boundary.
//!
//! The robot acknowledges commands and colors its responses with short
//! canned effects.  Playback is strictly fire-and-forget: a broken speaker
//! must never be able to stall or fail a control loop, so the trait
//! returns nothing and implementations log their own failures.

// ---------------------------------------------------------------------------
// SoundEffect
// ---------------------------------------------------------------------------

/// The fixed effect vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Short confirmation beep — played when a command is accepted.
    Acknowledge,
    /// Cheerful chirp.
    Happy,
    /// Rising questioning whistle.
    Curious,
    /// Low worried warble.
    Concerned,
    /// Alarmed squeal.
    Scared,
}

impl SoundEffect {
    /// Stable effect name, matching the audio asset files.
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Acknowledge => "acknowledge",
            SoundEffect::Happy => "happy",
            SoundEffect::Curious => "curious",
            SoundEffect::Concerned => "concerned",
            SoundEffect::Scared => "scared",
        }
    }
}

// ---------------------------------------------------------------------------
// SoundPlayer trait
// ---------------------------------------------------------------------------

/// Fire-and-forget effect playback.
///
/// Implementations must be `Send + Sync` (shared behind `Arc<dyn
/// SoundPlayer>`) and must swallow and log their own errors.
pub trait SoundPlayer: Send + Sync {
    /// Play `effect`.  Never blocks for the duration of the clip.
    fn play(&self, effect: SoundEffect);
}

// ---------------------------------------------------------------------------
// LogPlayer
// ---------------------------------------------------------------------------

/// Player stand-in for machines without a speaker: logs the effect name.
pub struct LogPlayer;

impl SoundPlayer for LogPlayer {
    fn play(&self, effect: SoundEffect) {
        log::info!("sound: [{}]", effect.name());
    }
}

// ---------------------------------------------------------------------------
// RecordingPlayer (test double)
// ---------------------------------------------------------------------------

/// Test player that records what was played.
#[cfg(test)]
pub(crate) struct RecordingPlayer {
    pub played: std::sync::Mutex<Vec<SoundEffect>>,
}

#[cfg(test)]
impl RecordingPlayer {
    pub fn new() -> Self {
        Self {
            played: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn take(&self) -> Vec<SoundEffect> {
        std::mem::take(&mut self.played.lock().unwrap())
    }
}

#[cfg(test)]
impl SoundPlayer for RecordingPlayer {
    fn play(&self, effect: SoundEffect) {
        self.played.lock().unwrap().push(effect);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_names_are_stable() {
        assert_eq!(SoundEffect::Acknowledge.name(), "acknowledge");
        assert_eq!(SoundEffect::Happy.name(), "happy");
        assert_eq!(SoundEffect::Scared.name(), "scared");
    }

    #[test]
    fn recording_player_captures_order() {
        let player = RecordingPlayer::new();
        player.play(SoundEffect::Curious);
        player.play(SoundEffect::Acknowledge);
        assert_eq!(
            player.take(),
            vec![SoundEffect::Curious, SoundEffect::Acknowledge]
        );
    }
}
