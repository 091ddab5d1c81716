//! Voice loop — wake episodes → dispatch → response path.
//!
//! [`VoiceLoop`] is the blocking audio/command unit.  Each iteration runs
//! one [`SpeechPipeline::listen`] episode on the blocking thread pool,
//! feeds any transcript to the [`CommandDispatcher`], and routes unhandled
//! text to the [`ResponseSink`].  After a completed episode it sits out
//! the configured cooldown so an echo of the robot's own acknowledgment
//! cannot re-trigger a wake.
//!
//! The loop checks `shutdown_requested` between episodes.  A `listen`
//! call that is mid-episode when shutdown arrives will run to completion
//! — the orchestrator joins this task with a bounded timeout and moves on
//! if the microphone is still holding it hostage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::SystemFlags;
use crate::voice::command::CommandDispatcher;
use crate::voice::response::ResponseSink;
use crate::voice::sound::SoundPlayer;
use crate::voice::speech::SpeechPipeline;

// ---------------------------------------------------------------------------
// VoiceLoop
// ---------------------------------------------------------------------------

/// The audio/command unit.
pub struct VoiceLoop {
    speech: Arc<dyn SpeechPipeline>,
    dispatcher: CommandDispatcher,
    player: Arc<dyn SoundPlayer>,
    response: Arc<dyn ResponseSink>,
    flags: Arc<SystemFlags>,
    cooldown: Duration,
}

impl VoiceLoop {
    /// Wire a voice loop to its collaborators.
    pub fn new(
        speech: Arc<dyn SpeechPipeline>,
        dispatcher: CommandDispatcher,
        player: Arc<dyn SoundPlayer>,
        response: Arc<dyn ResponseSink>,
        flags: Arc<SystemFlags>,
        cooldown: Duration,
    ) -> Self {
        Self {
            speech,
            dispatcher,
            player,
            response,
            flags,
            cooldown,
        }
    }

    /// Run until shutdown is requested.
    pub async fn run(self) {
        log::info!("voice: loop started, listening for the wake phrase");

        while !self.flags.shutdown_requested() {
            let speech = Arc::clone(&self.speech);
            let episode = match tokio::task::spawn_blocking(move || speech.listen()).await {
                Ok(Ok(episode)) => episode,
                Ok(Err(e)) => {
                    log::warn!("voice: speech episode failed: {e}");
                    continue;
                }
                Err(e) => {
                    log::error!("voice: speech task failed: {e}");
                    continue;
                }
            };

            let Some(text) = episode else {
                continue; // no wake / no speech this episode
            };

            if text.trim().is_empty() {
                log::debug!("voice: wake fired but nothing was said");
                self.cooldown().await;
                continue;
            }

            log::info!("voice: heard {text:?}");

            if !self
                .dispatcher
                .dispatch(&text, &self.flags, self.player.as_ref())
            {
                self.response.respond(&text).await;
            }

            self.cooldown().await;
        }

        log::info!("voice: shutdown observed, loop exiting");
    }

    /// Sit out the wake cooldown, still honoring shutdown.
    async fn cooldown(&self) {
        let until = Instant::now() + self.cooldown;
        while Instant::now() < until && !self.flags.shutdown_requested() {
            let remaining = until.saturating_duration_since(Instant::now());
            tokio::time::sleep(remaining.min(Duration::from_millis(100))).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
