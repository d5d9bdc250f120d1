use serde::{Deserialize, Serialize};

/// Snapshot of the dashboard's trigger inputs: three click counters and the
/// current contents of the two credential fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signals {
    pub process_clicks: u64,
    pub login_clicks: u64,
    pub register_clicks: u64,
    pub username: String,
    pub password: String,
}

/// One discrete user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    ProcessRequested,
    LoginAttempted { username: String, password: String },
    RegisterAttempted { username: String, password: String },
    Idle,
}

/// How counter snapshots become events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Only counters that moved since the previous snapshot fire.
    #[default]
    Edge,
    /// Any non-zero counter fires, on every snapshot.
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Process,
    Login,
    Register,
}

impl Signals {
    /// Level-triggered resolution. Precedence is process, login, register.
    pub fn resolve(&self) -> Event {
        let fired = if self.process_clicks != 0 {
            Some(Trigger::Process)
        } else if self.login_clicks > 0 {
            Some(Trigger::Login)
        } else if self.register_clicks > 0 {
            Some(Trigger::Register)
        } else {
            None
        };
        self.event_for(fired)
    }

    /// Edge-triggered resolution against the snapshot seen before this one.
    ///
    /// A counter fires when it differs from its previous value and is
    /// non-zero, so a client that resets its counters is not silenced.
    pub fn resolve_since(&self, previous: &Signals) -> Event {
        let moved = |now: u64, before: u64| now != before && now > 0;
        let fired = if moved(self.process_clicks, previous.process_clicks) {
            Some(Trigger::Process)
        } else if moved(self.login_clicks, previous.login_clicks) {
            Some(Trigger::Login)
        } else if moved(self.register_clicks, previous.register_clicks) {
            Some(Trigger::Register)
        } else {
            None
        };
        self.event_for(fired)
    }

    pub fn resolve_with(&self, previous: &Signals, mode: TriggerMode) -> Event {
        match mode {
            TriggerMode::Edge => self.resolve_since(previous),
            TriggerMode::Level => self.resolve(),
        }
    }

    fn event_for(&self, trigger: Option<Trigger>) -> Event {
        match trigger {
            Some(Trigger::Process) => Event::ProcessRequested,
            Some(Trigger::Login) => Event::LoginAttempted {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            Some(Trigger::Register) => Event::RegisterAttempted {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            None => Event::Idle,
        }
    }
}
