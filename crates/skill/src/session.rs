use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::envelope::Session;

pub const LAUNCHED_ATTRIBUTE: &str = "launched";

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Per-session state handed to the router for the duration of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    session_id: Option<String>,
    launched: bool,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: Some(session_id.into()), launched: false }
    }

    /// Context for a request that carries no session; never persisted.
    pub fn detached() -> Self {
        Self { session_id: None, launched: false }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn launched(&self) -> bool {
        self.launched
    }

    pub fn mark_launched(&mut self) {
        self.launched = true;
    }

    pub fn mark_ended(&mut self) {
        self.launched = false;
    }

    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        if self.session_id.is_some() {
            attributes.insert(LAUNCHED_ATTRIBUTE.to_owned(), Value::Bool(self.launched));
        }
        attributes
    }
}

#[derive(Clone, Copy, Debug)]
struct StoredSession {
    launched: bool,
    touched_at: Instant,
}

/// In-process session flags keyed by platform session id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), idle_ttl }
    }

    /// Resolves the context for an incoming request.
    ///
    /// A stored flag wins; otherwise the `launched` session attribute echoed
    /// back by the platform is used, unless the platform marks the session new.
    pub async fn load(&self, session: Option<&Session>) -> SessionContext {
        let Some(session) = session else {
            return SessionContext::detached();
        };

        let mut context = SessionContext::new(session.session_id.clone());
        if session.new {
            return context;
        }

        let stored = self.sessions.read().await.get(&session.session_id).map(|s| s.launched);
        let from_attributes =
            session.attributes.get(LAUNCHED_ATTRIBUTE).and_then(Value::as_bool).unwrap_or(false);

        if stored.unwrap_or(from_attributes) {
            context.mark_launched();
        }
        context
    }

    pub async fn save(&self, context: &SessionContext) {
        let Some(session_id) = context.session_id() else {
            return;
        };

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, stored| now.duration_since(stored.touched_at) < self.idle_ttl);

        if context.launched() {
            sessions.insert(
                session_id.to_owned(),
                StoredSession { launched: true, touched_at: now },
            );
        } else {
            sessions.remove(session_id);
        }
    }

    pub async fn end(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
