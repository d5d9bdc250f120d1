use crate::auth::{CredentialStore, SessionId, SessionRegistry};
use crate::prelude::{CoreError, CoreResult};
use crate::processing::{build_area_chart, build_heatmap_chart, BatchProcessor, LabelDistribution};
use crate::reducer::event::{Event, Signals, TriggerMode};
use crate::reducer::view::{
    processed_message, processing_failed_message, ViewState, ACCESS_GRANTED, INVALID_CREDENTIALS,
    LOGIN_REQUIRED, REGISTERED, USER_EXISTS,
};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    LoginRequired,
    Completed(LabelDistribution),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyExists,
    Rejected(String),
}

/// Typed result of dispatching one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Process(ProcessOutcome),
    Login { granted: bool },
    Register(RegisterOutcome),
    Idle,
}

impl Outcome {
    /// Builds the complete view state for this outcome.
    pub fn render(&self) -> ViewState {
        match self {
            Outcome::Process(ProcessOutcome::LoginRequired) => ViewState {
                processing_message: LOGIN_REQUIRED.into(),
                ..ViewState::idle()
            },
            Outcome::Process(ProcessOutcome::Completed(distribution)) => ViewState {
                area_chart: build_area_chart(distribution),
                heatmap_chart: build_heatmap_chart(distribution),
                processing_message: processed_message(distribution.total()),
                ..ViewState::dashboard()
            },
            Outcome::Process(ProcessOutcome::Failed(reason)) => ViewState {
                processing_message: processing_failed_message(reason),
                ..ViewState::dashboard()
            },
            Outcome::Login { granted: true } => ViewState {
                access_message: ACCESS_GRANTED.into(),
                ..ViewState::dashboard()
            },
            Outcome::Login { granted: false } => ViewState {
                access_message: INVALID_CREDENTIALS.into(),
                ..ViewState::idle()
            },
            Outcome::Register(outcome) => {
                let access_message = match outcome {
                    RegisterOutcome::Registered => REGISTERED.to_string(),
                    RegisterOutcome::AlreadyExists => USER_EXISTS.to_string(),
                    RegisterOutcome::Rejected(reason) => reason.clone(),
                };
                ViewState {
                    access_message,
                    ..ViewState::idle()
                }
            }
            Outcome::Idle => ViewState::idle(),
        }
    }
}

/// Owns every piece of mutable dashboard state and reduces events against it.
///
/// Callers must serialize access; the bridge does so by confining the
/// dashboard to a single state thread.
pub struct Dashboard {
    credentials: CredentialStore,
    sessions: SessionRegistry,
    processor: BatchProcessor,
    metrics: MetricsRecorder,
    trigger_mode: TriggerMode,
    logger: LogManager,
}

impl Dashboard {
    pub fn new(credentials: CredentialStore, processor: BatchProcessor) -> Self {
        Self {
            credentials,
            sessions: SessionRegistry::new(),
            processor,
            metrics: MetricsRecorder::new(),
            trigger_mode: TriggerMode::default(),
            logger: LogManager::new("reducer"),
        }
    }

    pub fn with_trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    pub fn open_session(&mut self) -> SessionId {
        let id = self.sessions.open();
        debug!("opened session {id}");
        id
    }

    pub fn close_session(&mut self, session: &SessionId) -> bool {
        self.sessions.close(session)
    }

    /// Resolves a trigger snapshot into an event and reduces it.
    pub fn handle_signals(&mut self, session: SessionId, signals: Signals) -> CoreResult<ViewState> {
        let state = self
            .sessions
            .get_mut(&session)
            .ok_or(CoreError::UnknownSession(session))?;
        let event = signals.resolve_with(&state.last_signals, self.trigger_mode);
        state.last_signals = signals;
        self.handle_event(session, event)
    }

    pub fn handle_event(&mut self, session: SessionId, event: Event) -> CoreResult<ViewState> {
        Ok(self.dispatch(session, event)?.render())
    }

    pub fn dispatch(&mut self, session: SessionId, event: Event) -> CoreResult<Outcome> {
        if self.sessions.get(&session).is_none() {
            return Err(CoreError::UnknownSession(session));
        }

        let outcome = match event {
            Event::ProcessRequested => Outcome::Process(self.process(&session)),
            Event::LoginAttempted { username, password } => {
                self.login(&session, &username, &password)
            }
            Event::RegisterAttempted { username, password } => {
                Outcome::Register(self.register(&username, &password))
            }
            Event::Idle => Outcome::Idle,
        };
        Ok(outcome)
    }

    /// Idle view for a returning client: the dashboard when logged in,
    /// the auth panel otherwise.
    pub fn view(&self, session: &SessionId) -> CoreResult<ViewState> {
        match self.sessions.get(session) {
            Some(state) if state.authenticated => Ok(ViewState::dashboard()),
            Some(_) => Ok(ViewState::idle()),
            None => Err(CoreError::UnknownSession(*session)),
        }
    }

    pub fn is_authenticated(&self, session: &SessionId) -> bool {
        self.sessions.is_authenticated(session)
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn process(&self, session: &SessionId) -> ProcessOutcome {
        if !self.sessions.is_authenticated(session) {
            return ProcessOutcome::LoginRequired;
        }

        match self.processor.run_batch() {
            Ok(report) => {
                self.metrics.record_batch(report.decoded, report.skipped);
                ProcessOutcome::Completed(LabelDistribution::count(&report.labels))
            }
            Err(err) => {
                warn!("batch over {} failed: {err}", self.processor.image_dir().display());
                self.metrics.record_batch_failure();
                ProcessOutcome::Failed(err.to_string())
            }
        }
    }

    fn login(&mut self, session: &SessionId, username: &str, password: &str) -> Outcome {
        let granted = self.credentials.authenticate(username, password);
        if granted {
            self.sessions.mark_authenticated(session);
            self.logger
                .record(&format!("session {session} authenticated as {username}"));
        }
        self.metrics.record_login(granted);
        Outcome::Login { granted }
    }

    fn register(&mut self, username: &str, password: &str) -> RegisterOutcome {
        match self.credentials.register(username, password) {
            Ok(()) => {
                self.metrics.record_registration();
                self.logger.record(&format!("registered user {username}"));
                RegisterOutcome::Registered
            }
            Err(CoreError::AlreadyExists(_)) => RegisterOutcome::AlreadyExists,
            Err(err) => {
                warn!("{err}");
                RegisterOutcome::Rejected(format!("registration failed: {err}"))
            }
        }
    }
}
