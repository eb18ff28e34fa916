//! Per-connection heist feed.
//!
//! Pushes the member's filtered heist list whenever it changes and accepts
//! filter switches from the client. The connection pings every 5s and is
//! considered idle after 10s without client traffic; tests shorten both.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use mockable::Clock;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, warn};

use super::messages::FilterRequest;
use crate::domain::views::HeistSection;
use crate::domain::{HeistList, HeistListWatch};
use crate::inbound::http::guard::CurrentAuth;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    FeedClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

/// Live feed over one [`HeistListWatch`].
pub(super) struct HeistFeed {
    // Keeps the auth client, and so the watch's auth input, alive.
    _auth: CurrentAuth,
    watch: HeistListWatch,
    clock: Arc<dyn Clock>,
}

impl HeistFeed {
    pub(super) fn new(auth: CurrentAuth, watch: HeistListWatch, clock: Arc<dyn Clock>) -> Self {
        Self {
            _auth: auth,
            watch,
            clock,
        }
    }

    pub(super) async fn run(self, mut session: Session, mut stream: MessageStream) {
        let mut updates = self.watch.subscribe();
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let mut result = self.push(&mut session, &mut updates).await;
        while result.is_ok() {
            result = tokio::select! {
                _ = heartbeat.tick() => {
                    handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                changed = updates.changed() => match changed {
                    Ok(()) => self.push(&mut session, &mut updates).await,
                    Err(_) => Err(SessionError::FeedClosed),
                },
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
            };
        }
        if let Err(error) = result {
            log_shutdown_reason(&error);
            close_session_if_needed(session, close_action_for(&error)).await;
        }
    }

    async fn push(
        &self,
        session: &mut Session,
        updates: &mut watch::Receiver<HeistList>,
    ) -> Result<(), SessionError> {
        let list = updates.borrow_and_update().clone();
        let section = HeistSection::new(&list, self.clock.utc());
        send_json(session, &section)
            .await
            .map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };
        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionError::Network)
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(text.as_ref())
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    fn handle_text_message(&self, text: &str) -> Result<(), SessionError> {
        let request = serde_json::from_str::<FilterRequest>(text).map_err(|error| {
            warn!(error = %error, "rejected malformed feed request");
            SessionError::InvalidPayload
        })?;
        debug!(filter = %request.filter, "feed filter changed");
        self.watch.set_filter(request.filter);
        Ok(())
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: &Instant,
) -> Result<(), SessionError> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }
    session.ping(b"").await.map_err(SessionError::Network)
}

async fn send_json<T: serde::Serialize>(session: &mut Session, payload: &T) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "failed to serialise feed payload");
            Ok(())
        }
    }
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => warn!("feed heartbeat timeout; closing connection"),
        SessionError::Protocol(error) => warn!(error = %error, "feed protocol error"),
        SessionError::Network(error) => warn!(error = %error, "feed send failed"),
        SessionError::FeedClosed => warn!("heist watch stopped; closing feed"),
        SessionError::InvalidPayload | SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
    }
}

fn close_action_for(error: &SessionError) -> CloseAction {
    let close = |code, description: &str| {
        CloseAction::Close(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    };
    match error {
        SessionError::HeartbeatTimeout => close(CloseCode::Normal, "heartbeat timeout"),
        SessionError::Protocol(_) => close(CloseCode::Protocol, "protocol error"),
        SessionError::InvalidPayload => close(CloseCode::Policy, "invalid payload"),
        SessionError::FeedClosed => close(CloseCode::Away, "feed closed"),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

async fn close_session_if_needed(session: Session, action: CloseAction) {
    if let CloseAction::Close(reason) = action {
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "failed to close feed session");
        }
    }
}
