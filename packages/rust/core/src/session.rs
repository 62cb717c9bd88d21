//! Pending-selection state, one slot per conversation.

use async_trait::async_trait;
use dashmap::DashMap;

use linkcatalog_shared::{ConversationId, PendingSession, Result};

/// Key-value store of pending sessions keyed by conversation.
///
/// A conversation with a stored session is awaiting a category choice;
/// one without is idle.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: ConversationId) -> Result<Option<PendingSession>>;

    /// Store `session`, replacing any previous one for `id`.
    async fn put(&self, id: ConversationId, session: PendingSession) -> Result<()>;

    /// Remove the session for `id`. Clearing an idle conversation is a no-op.
    async fn clear(&self, id: ConversationId) -> Result<()>;
}

/// Process-local [`SessionStore`]. Sessions are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<ConversationId, PendingSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations currently awaiting a category.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: ConversationId) -> Result<Option<PendingSession>> {
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn put(&self, id: ConversationId, session: PendingSession) -> Result<()> {
        self.sessions.insert(id, session);
        Ok(())
    }

    async fn clear(&self, id: ConversationId) -> Result<()> {
        self.sessions.remove(&id);
        Ok(())
    }
}
