//! Response path boundary.
//!
//! Utterances that are not system commands belong to the robot's
//! conversational side — emotion classification and a voiced reply.  That
//! pipeline lives outside this crate; [`ResponseSink`] is the seam the
//! voice loop hands unhandled text to.
//!
//! The trait is async because real sinks call out to an inference backend.
//! Like sound playback, the response path must never feed failures back
//! into control flow: implementations swallow and log their own errors.

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// ResponseSink trait
// ---------------------------------------------------------------------------

/// Consumer for utterances the command dispatcher did not handle.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn ResponseSink>`.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// React to `text`.  Must not panic and must not block unboundedly on
    /// the caller's task beyond its own backend call.
    async fn respond(&self, text: &str);
}

// ---------------------------------------------------------------------------
// NullResponse
// ---------------------------------------------------------------------------

/// Sink stand-in: logs the utterance and does nothing else.
pub struct NullResponse;

#[async_trait]
impl ResponseSink for NullResponse {
    async fn respond(&self, text: &str) {
        log::info!("response: no backend configured, dropping {text:?}");
    }
}

// ---------------------------------------------------------------------------
// RecordingResponse (test double)
// ---------------------------------------------------------------------------

/// Test sink that records every utterance routed to it.
#[cfg(test)]
pub(crate) struct RecordingResponse {
    pub texts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingResponse {
    pub fn new() -> Self {
        Self {
            texts: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ResponseSink for RecordingResponse {
    async fn respond(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
