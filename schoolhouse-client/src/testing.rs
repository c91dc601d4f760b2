//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use schoolhouse_session::{Session, SessionEvent, SessionProvider, SessionResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;
use wiremock::MockServer;

use crate::config::ClientConfig;

/// Provider that counts refreshes and answers with a scripted outcome.
#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    session: Mutex<Option<Session>>,
    outcome: SessionResult<Option<Session>>,
    delay: Duration,
    calls: AtomicU32,
    events: broadcast::Sender<SessionEvent>,
}

impl ScriptedProvider {
    pub(crate) fn new(
        current: Option<Session>,
        outcome: SessionResult<Option<Session>>,
    ) -> Self {
        let (events, _) = broadcast::channel(4);
        Self {
            session: Mutex::new(current),
            outcome,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            events,
        }
    }

    /// Refresh that succeeds with `tok2`.
    pub(crate) fn rotating() -> Self {
        Self::new(
            Some(Session::new("tok1", "ref1")),
            Ok(Some(Session::new("tok2", "ref2"))),
        )
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn refresh_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    fn current_session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    async fn refresh_session(&self) -> SessionResult<Option<Session>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if let Ok(Some(session)) = &self.outcome {
            *self.session.lock() = Some(session.clone());
        }
        self.outcome.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

pub(crate) fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(Url::parse(&server.uri()).unwrap()).with_api_key("anon")
}
