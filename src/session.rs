//! Poem status relay.
//!
//! A workflow engine reports when a poem starts generating and when it is
//! done; a browser waiting on the same session id receives each update as a
//! server-sent event. The latest status is kept so late subscribers catch up,
//! for at most [`MAX_TRACKED_SESSIONS`] sessions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::constants::MAX_TRACKED_SESSIONS;

/// Generation state of a poem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Subscriber registered; only sent as the greeting
    Connected,
    /// The poem is being written
    Generating,
    /// The poem is ready
    Completed,
}

/// Status message pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoemStatus {
    /// Current phase
    pub status: Phase,
    /// Session the status belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Finished poem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poem: Option<String>,
}

impl PoemStatus {
    /// Greeting sent when a subscriber connects.
    pub const fn connected() -> Self {
        Self { status: Phase::Connected, session_id: None, poem: None }
    }

    /// Poem generation started.
    pub fn generating(session_id: impl Into<String>) -> Self {
        Self { status: Phase::Generating, session_id: Some(session_id.into()), poem: None }
    }

    /// Poem finished.
    pub fn completed(session_id: impl Into<String>, poem: impl Into<String>) -> Self {
        Self {
            status: Phase::Completed,
            session_id: Some(session_id.into()),
            poem: Some(poem.into()),
        }
    }

    /// Whether no further updates follow.
    pub fn is_final(&self) -> bool {
        self.status == Phase::Completed
    }
}

#[derive(Default)]
struct Sessions {
    subscribers: HashMap<String, UnboundedSender<PoemStatus>>,
    statuses: HashMap<String, PoemStatus>,
    /// Session ids with a stored status, oldest first
    order: VecDeque<String>,
}

impl Sessions {
    fn store(&mut self, session_id: &str, status: PoemStatus, capacity: usize) {
        if self.statuses.insert(session_id.to_string(), status).is_some() {
            return;
        }
        self.order.push_back(session_id.to_string());

        while self.order.len() > capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.statuses.remove(&oldest);
            self.subscribers.remove(&oldest);
            tracing::debug!("Forgot status of session {oldest}");
        }
    }
}

/// Shared registry of poem statuses and their subscribers.
pub struct SessionHub {
    inner: Mutex<Sessions>,
    capacity: usize,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::with_capacity(MAX_TRACKED_SESSIONS)
    }
}

impl SessionHub {
    /// An empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty hub remembering at most `capacity` session statuses.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: Mutex::new(Sessions::default()), capacity: capacity.max(1) }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // Sessions stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to a session's updates.
    ///
    /// The stream starts with a `connected` greeting and the stored status, if
    /// any. It ends after a `completed` status, or right away when the stored
    /// status is already `completed`. A new subscriber replaces the previous
    /// one for the same session.
    pub fn subscribe(&self, session_id: &str) -> impl Stream<Item = PoemStatus> + Send + 'static {
        let mut greeting = vec![PoemStatus::connected()];
        let mut sessions = self.lock();

        let stored = sessions.statuses.get(session_id).cloned();
        let finished = stored.as_ref().is_some_and(PoemStatus::is_final);
        greeting.extend(stored);

        let updates: Option<UnboundedReceiver<PoemStatus>> = if finished {
            None
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            sessions.subscribers.insert(session_id.to_string(), tx);
            Some(rx)
        };
        drop(sessions);

        tracing::info!("Subscriber connected to session {session_id}");

        let updates = stream::iter(updates).flat_map(|rx| {
            stream::unfold(rx, |mut rx| async move {
                let status = rx.recv().await?;
                Some((status, rx))
            })
        });
        stream::iter(greeting).chain(updates)
    }

    /// Record that the poem for `session_id` is being generated.
    pub fn mark_generating(&self, session_id: &str) {
        self.publish(PoemStatus::generating(session_id));
    }

    /// Record the finished poem and close the session's subscription.
    pub fn mark_completed(&self, session_id: &str, poem: &str) {
        self.publish(PoemStatus::completed(session_id, poem));
    }

    fn publish(&self, status: PoemStatus) {
        let Some(session_id) = status.session_id.clone() else {
            return;
        };
        let mut sessions = self.lock();
        sessions.store(&session_id, status.clone(), self.capacity);

        let final_update = status.is_final();
        let delivered = sessions
            .subscribers
            .get(&session_id)
            .is_some_and(|tx| tx.send(status).is_ok());

        // Dropping the sender ends the subscriber's stream
        if final_update || !delivered {
            sessions.subscribers.remove(&session_id);
        }

        tracing::debug!("Published status for session {session_id} (delivered: {delivered})");
    }

    /// Number of live subscribers.
    pub fn connection_count(&self) -> usize {
        let mut sessions = self.lock();
        sessions.subscribers.retain(|_, tx| !tx.is_closed());
        sessions.subscribers.len()
    }

    /// Number of sessions with a stored status. Bounded by the hub's capacity.
    pub fn poem_count(&self) -> usize {
        self.lock().statuses.len()
    }
}
