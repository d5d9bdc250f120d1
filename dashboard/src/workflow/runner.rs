use anyhow::{anyhow, Context};
use dashcore::auth::SessionId;
use dashcore::telemetry::MetricsSnapshot;
use dashcore::{CoreResult, Dashboard, Event, Signals, ViewState};
use log::debug;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};

const COMMAND_QUEUE: usize = 64;

enum Command {
    OpenSession {
        reply: oneshot::Sender<SessionId>,
    },
    Signals {
        session: SessionId,
        signals: Signals,
        reply: oneshot::Sender<CoreResult<ViewState>>,
    },
    Event {
        session: SessionId,
        event: Event,
        reply: oneshot::Sender<CoreResult<ViewState>>,
    },
    View {
        session: SessionId,
        reply: oneshot::Sender<CoreResult<ViewState>>,
    },
    Stats {
        reply: oneshot::Sender<MetricsSnapshot>,
    },
}

/// Handle to the thread that owns the [`Dashboard`].
///
/// Every command is applied to completion before the next one is taken, so
/// sessions and the credential store see a single writer. Batch processing
/// blocks that thread, never the async runtime.
#[derive(Clone)]
pub struct Runner {
    commands: mpsc::Sender<Command>,
}

impl Runner {
    pub fn spawn(dashboard: Dashboard) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let (commands, mut inbox) = mpsc::channel(COMMAND_QUEUE);
        let handle = thread::Builder::new()
            .name("dashboard-state".into())
            .spawn(move || {
                let mut dashboard = dashboard;
                while let Some(command) = inbox.blocking_recv() {
                    apply(&mut dashboard, command);
                }
                debug!("dashboard state thread stopped");
            })
            .context("spawning dashboard state thread")?;
        Ok((Self { commands }, handle))
    }

    pub async fn open_session(&self) -> anyhow::Result<SessionId> {
        self.request(|reply| Command::OpenSession { reply }).await
    }

    pub async fn apply_signals(
        &self,
        session: SessionId,
        signals: Signals,
    ) -> anyhow::Result<ViewState> {
        let view = self
            .request(|reply| Command::Signals {
                session,
                signals,
                reply,
            })
            .await?;
        Ok(view?)
    }

    pub async fn apply_event(&self, session: SessionId, event: Event) -> anyhow::Result<ViewState> {
        let view = self
            .request(|reply| Command::Event {
                session,
                event,
                reply,
            })
            .await?;
        Ok(view?)
    }

    pub async fn view(&self, session: SessionId) -> anyhow::Result<ViewState> {
        let view = self
            .request(|reply| Command::View { session, reply })
            .await?;
        Ok(view?)
    }

    pub async fn stats(&self) -> anyhow::Result<MetricsSnapshot> {
        self.request(|reply| Command::Stats { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> anyhow::Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| anyhow!("dashboard state thread is gone"))?;
        response
            .await
            .context("dashboard state thread dropped the reply")
    }
}

fn apply(dashboard: &mut Dashboard, command: Command) {
    // A dropped reply only means the caller went away.
    match command {
        Command::OpenSession { reply } => {
            let _ = reply.send(dashboard.open_session());
        }
        Command::Signals {
            session,
            signals,
            reply,
        } => {
            let _ = reply.send(dashboard.handle_signals(session, signals));
        }
        Command::Event {
            session,
            event,
            reply,
        } => {
            let _ = reply.send(dashboard.handle_event(session, event));
        }
        Command::View { session, reply } => {
            let _ = reply.send(dashboard.view(&session));
        }
        Command::Stats { reply } => {
            let _ = reply.send(dashboard.metrics());
        }
    }
}
