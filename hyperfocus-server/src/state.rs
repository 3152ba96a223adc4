//! Shared application state for the HTTP server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hyperfocus::Hyperfocus;
use hyperfocus::streamer::SessionControl;
use uuid::Uuid;

/// Shared state accessible from all request handlers.
pub struct AppState<G> {
    /// Responders, team and session streamer, built once at startup.
    pub app: Arc<Hyperfocus<G>>,
    /// Controls for sessions whose event stream is still open.
    sessions: Arc<Mutex<HashMap<Uuid, SessionControl>>>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<G> AppState<G> {
    pub fn new(app: Hyperfocus<G>) -> Self {
        Self {
            app: Arc::new(app),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Track a live session. The session is forgotten when the returned guard drops.
    pub fn register(&self, control: SessionControl) -> SessionRegistration {
        let id = Uuid::new_v4();
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, control);
        }
        SessionRegistration {
            id,
            sessions: self.sessions.clone(),
        }
    }

    pub fn session(&self, id: Uuid) -> Option<SessionControl> {
        self.sessions.lock().ok()?.get(&id).cloned()
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Removes a session from the registry when dropped.
pub struct SessionRegistration {
    id: Uuid,
    sessions: Arc<Mutex<HashMap<Uuid, SessionControl>>>,
}

impl SessionRegistration {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SessionRegistration {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&self.id);
        }
    }
}
