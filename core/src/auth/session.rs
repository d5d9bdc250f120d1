use crate::reducer::Signals;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque token identifying one dashboard client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Per-client state: the auth flag plus the last trigger snapshot seen.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub authenticated: bool,
    pub last_signals: Signals,
}

/// Token-keyed replacement for a process-wide authentication flag.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id, Session::default());
        id
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn is_authenticated(&self, id: &SessionId) -> bool {
        self.sessions
            .get(id)
            .map(|session| session.authenticated)
            .unwrap_or(false)
    }

    /// Returns false when the session is unknown.
    pub fn mark_authenticated(&mut self, id: &SessionId) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.authenticated = true;
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_start_unauthenticated_and_stay_isolated() {
        let mut registry = SessionRegistry::new();
        let first = registry.open();
        let second = registry.open();
        assert_ne!(first, second);
        assert!(!registry.is_authenticated(&first));

        assert!(registry.mark_authenticated(&first));
        assert!(registry.is_authenticated(&first));
        assert!(!registry.is_authenticated(&second));
    }

    #[test]
    fn unknown_and_closed_sessions_are_never_authenticated() {
        let mut registry = SessionRegistry::new();
        let stranger = SessionId::new();
        assert!(!registry.mark_authenticated(&stranger));
        assert!(!registry.is_authenticated(&stranger));

        let id = registry.open();
        registry.mark_authenticated(&id);
        assert!(registry.close(&id));
        assert!(!registry.is_authenticated(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn session_id_round_trips_through_text() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
