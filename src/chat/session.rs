//! The chat session: transcript state plus the submission flow.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::llm::GenerationClient;

use super::Message;

/// Result of a [`ChatSession::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty or whitespace-only; nothing happened.
    Ignored,
    /// A request was already in flight; nothing happened.
    Busy,
    /// The reply was appended to the transcript.
    Replied,
    /// The transcript was cleared mid-flight; the reply was discarded.
    Discarded,
}

/// A single conversation session.
///
/// The transcript is append-only and insertion-ordered. Exactly one
/// generation request may be outstanding at a time; further submissions
/// are ignored rather than queued. The transcript is never persisted.
#[derive(Debug, Clone)]
pub struct ChatSession {
    inner: Arc<ChatInner>,
    client: GenerationClient,
}

#[derive(Debug)]
struct ChatInner {
    messages: RwLock<Vec<Message>>,
    /// Set while a generation request is outstanding.
    in_flight: AtomicBool,
    /// Bumped by `clear`; replies from an older epoch are discarded.
    epoch: AtomicU64,
}

impl ChatSession {
    /// Create an empty session over the given generation client.
    #[must_use]
    pub fn new(client: GenerationClient) -> Self {
        Self {
            inner: Arc::new(ChatInner {
                messages: RwLock::new(Vec::new()),
                in_flight: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
            client,
        }
    }

    /// Submit user input to the session.
    ///
    /// Appends the user message immediately, then awaits the generation
    /// client and appends the reply. The generation client substitutes a
    /// fallback string on failure, so the transcript always gains a
    /// user/assistant pair unless the input was ignored or the session
    /// was cleared while the request was in flight.
    ///
    /// The request runs on a detached task: if the caller is cancelled
    /// (dropped connection, request timeout), the reply still lands and
    /// the in-flight guard still releases when the request resolves.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            return SubmitOutcome::Ignored;
        }

        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            debug!(name: "chat.submit.busy", "Submission ignored: request in flight");
            return SubmitOutcome::Busy;
        }

        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        self.push(Message::user(trimmed.clone()));

        let session = self.clone();
        let request = tokio::spawn(async move {
            // Releases the guard even if the reply path panics.
            let _release = InFlightRelease(Arc::clone(&session.inner));

            let reply = session.client.reply(&trimmed).await;

            if session.inner.epoch.load(Ordering::SeqCst) == epoch {
                session.push(Message::assistant(reply));
                SubmitOutcome::Replied
            } else {
                debug!(name: "chat.submit.stale", "Reply discarded: transcript cleared mid-flight");
                SubmitOutcome::Discarded
            }
        });

        match request.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(name: "chat.submit.join_failed", error = %e, "Generation task failed");
                SubmitOutcome::Discarded
            }
        }
    }

    /// Empty the transcript unconditionally.
    ///
    /// Any in-flight reply belongs to the previous epoch and will be
    /// discarded when it lands.
    pub fn clear(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.messages.write().unwrap().clear();
    }

    /// All messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner.messages.read().unwrap().clone()
    }

    /// Number of messages in the transcript.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.messages.read().unwrap().len()
    }

    /// Whether a generation request is currently outstanding.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, message: Message) {
        self.inner.messages.write().unwrap().push(message);
    }
}

/// Stores `false` into the in-flight flag when dropped.
struct InFlightRelease(Arc<ChatInner>);

impl Drop for InFlightRelease {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}
