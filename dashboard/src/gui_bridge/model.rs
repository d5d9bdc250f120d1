use dashcore::auth::SessionId;
use dashcore::{Event, Signals};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReply {
    pub session: SessionId,
}

/// Counter snapshot posted to `/signals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsRequest {
    pub session: SessionId,
    #[serde(flatten)]
    pub signals: Signals,
}

/// Discrete action posted to `/event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequest {
    pub session: SessionId,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewQuery {
    pub session: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}
