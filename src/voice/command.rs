//! Voice command parsing and dispatch.
//!
//! # Overview
//!
//! [`CommandDispatcher`] turns transcribed text into flag changes on
//! [`SystemFlags`].  Matching is case-insensitive substring containment
//! against the configured vocabulary: STT output for short commands is
//! messy ("uh, stop tracking please") and exact matching would miss most
//! of it.
//!
//! # Precedence
//!
//! 1. While muted, only the unmute phrase does anything; every other
//!    utterance is swallowed as handled so nothing leaks to the response
//!    path from a muted robot.
//! 2. Unmute is checked before mute — the mute phrase is a substring of
//!    the unmute phrase with the default vocabulary, and "unmute" said to
//!    an unmuted robot must not mute it.
//! 3. Mute / start-tracking / stop-tracking each flip their flag.  Mute
//!    itself is silent (an acknowledgment from a robot just told to be
//!    quiet would be rude); the others beep.
//!
//! Anything unmatched returns `handled = false` and the caller routes the
//! text to the response pipeline.

use crate::config::VoiceConfig;
use crate::state::SystemFlags;
use crate::voice::sound::{SoundEffect, SoundPlayer};

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A recognized system command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Silence command processing until unmuted.
    Mute,
    /// Resume command processing.
    Unmute,
    /// Resume person tracking.
    EnableTracking,
    /// Pause person tracking (the servo holds its last target).
    DisableTracking,
}

// ---------------------------------------------------------------------------
// CommandDispatcher
// ---------------------------------------------------------------------------

/// Matches utterances against the configured vocabulary and applies them
/// to the shared flags.
///
/// # Example
///
/// ```rust
/// use pan_tracker::config::VoiceConfig;
/// use pan_tracker::state::SystemFlags;
/// use pan_tracker::voice::{CommandDispatcher, LogPlayer};
///
/// let dispatcher = CommandDispatcher::new(&VoiceConfig::default());
/// let flags = SystemFlags::new();
///
/// assert!(dispatcher.dispatch("please STOP TRACKING now", &flags, &LogPlayer));
/// assert!(!flags.tracking_enabled());
///
/// // Not a command — goes to the response path instead.
/// assert!(!dispatcher.dispatch("what's the weather", &flags, &LogPlayer));
/// ```
pub struct CommandDispatcher {
    mute: String,
    unmute: String,
    enable_tracking: String,
    disable_tracking: String,
}

impl CommandDispatcher {
    /// Build a dispatcher from the configured vocabulary.
    pub fn new(cfg: &VoiceConfig) -> Self {
        Self {
            mute: cfg.mute_phrase.to_lowercase(),
            unmute: cfg.unmute_phrase.to_lowercase(),
            enable_tracking: cfg.enable_tracking_phrase.to_lowercase(),
            disable_tracking: cfg.disable_tracking_phrase.to_lowercase(),
        }
    }

    /// Parse `text` into a [`Command`] without applying it.
    ///
    /// Unmute is matched first; see the module docs for why.
    pub fn parse(&self, text: &str) -> Option<Command> {
        let text = text.to_lowercase();

        if text.contains(&self.unmute) {
            Some(Command::Unmute)
        } else if text.contains(&self.mute) {
            Some(Command::Mute)
        } else if text.contains(&self.enable_tracking) {
            Some(Command::EnableTracking)
        } else if text.contains(&self.disable_tracking) {
            Some(Command::DisableTracking)
        } else {
            None
        }
    }

    /// Apply `text` to `flags`, playing acknowledgment effects on
    /// `player`.
    ///
    /// Returns `true` when the utterance was consumed (including
    /// everything swallowed while muted); `false` when the caller should
    /// route it to the response pipeline.
    pub fn dispatch(&self, text: &str, flags: &SystemFlags, player: &dyn SoundPlayer) -> bool {
        if flags.is_muted() {
            if text.to_lowercase().contains(&self.unmute) {
                flags.set_muted(false);
                log::info!("command: unmuted");
                player.play(SoundEffect::Acknowledge);
            } else {
                log::debug!("command: muted, swallowing {text:?}");
            }
            return true;
        }

        match self.parse(text) {
            Some(Command::Unmute) => {
                // Already unmuted; consume the phrase without effect.
                log::debug!("command: unmute while not muted, ignoring");
                true
            }
            Some(Command::Mute) => {
                flags.set_muted(true);
                log::info!("command: muted");
                true
            }
            Some(Command::EnableTracking) => {
                flags.set_tracking(true);
                log::info!("command: tracking enabled");
                player.play(SoundEffect::Acknowledge);
                true
            }
            Some(Command::DisableTracking) => {
                flags.set_tracking(false);
                log::info!("command: tracking disabled");
                player.play(SoundEffect::Acknowledge);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
