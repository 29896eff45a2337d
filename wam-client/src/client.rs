//! Request/response multiplexing over a speaker connection
//!
//! Replies are not returned on the socket a command was written to. They
//! arrive later on the listen connection, mixed with events triggered by
//! other clients. [`WamClient::request`] therefore allows one command in
//! flight at a time and waits for the first pushed message whose method
//! matches the command's expected reply.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{oneshot, watch};
use wam_api::{Command, Envelope};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionState, MessageHandler};
use crate::error::{ClientError, Result};

/// Callback receiving every decoded envelope
pub type EnvelopeListener = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// Handle returned by [`WamClient::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The one command waiting for its reply
struct PendingSlot {
    method: String,
    /// Required sender identity for requester-scoped commands
    user: Option<String>,
    reply: oneshot::Sender<Envelope>,
}

impl PendingSlot {
    fn matches(&self, envelope: &Envelope) -> bool {
        envelope.method == self.method
            && self
                .user
                .as_ref()
                .map_or(true, |user| envelope.sender_id == *user)
    }
}

#[derive(Default)]
struct Dispatcher {
    pending: Mutex<Option<PendingSlot>>,
    listeners: RwLock<Vec<(ListenerId, EnvelopeListener)>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Entry point for every envelope read from the listen connection
    ///
    /// A panicking listener is logged and skipped so the others and the
    /// waiting request still see the envelope.
    fn dispatch(&self, envelope: Envelope) {
        let listeners: Vec<(ListenerId, EnvelopeListener)> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&envelope))).is_err() {
                tracing::error!(
                    method = %envelope.method,
                    "Listener {:?} panicked while handling an envelope",
                    id
                );
            }
        }

        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|slot| slot.matches(&envelope)) {
            if let Some(slot) = pending.take() {
                tracing::debug!("Resolved pending '{}'", slot.method);
                let _ = slot.reply.send(envelope);
            }
        }
    }
}

/// Client for one speaker
///
/// ```rust,no_run
/// use wam_client::{ClientConfig, WamClient};
/// use wam_api::commands;
///
/// # async fn run() -> wam_client::Result<()> {
/// let client = WamClient::new("192.168.1.100", ClientConfig::new());
/// client.connect().await?;
/// client.start_listening().await?;
///
/// let reply = client.request(&commands::get_volume()).await?;
/// println!("volume: {:?}", reply.get_str("volume"));
///
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct WamClient {
    connection: Arc<Connection>,
    dispatcher: Arc<Dispatcher>,
    in_flight: tokio::sync::Mutex<()>,
}

impl WamClient {
    pub fn new(ip: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            connection: Arc::new(Connection::new(ip, config)),
            dispatcher: Arc::new(Dispatcher::default()),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn ip(&self) -> &str {
        self.connection.ip()
    }

    pub fn port(&self) -> u16 {
        self.connection.config().port
    }

    /// Identity token this client sends with every command
    pub fn user(&self) -> &str {
        &self.connection.config().user
    }

    pub fn config(&self) -> &ClientConfig {
        self.connection.config()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Connected | ConnectionState::Listening
        )
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ConnectionState::Listening
    }

    /// Receiver observing connection state transitions
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Resolves when the listen connection has ended, for any reason
    pub async fn closed(&self) {
        self.connection.closed().await
    }

    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    pub async fn connect_with_timeout(&self, timeout: Duration) -> Result<()> {
        self.connection.connect_with_timeout(timeout).await
    }

    pub async fn start_listening(&self) -> Result<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let handler: MessageHandler = Arc::new(move |envelope| dispatcher.dispatch(envelope));
        self.connection.start_listening(handler).await
    }

    pub async fn stop_listening(&self) {
        self.connection.stop_listening().await
    }

    /// Close the connection; safe to call repeatedly
    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }

    /// Register a callback for every envelope received
    pub fn add_listener(&self, listener: EnvelopeListener) -> ListenerId {
        let id = ListenerId(self.dispatcher.next_id.fetch_add(1, Ordering::Relaxed));
        self.dispatcher.listeners.write().push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.dispatcher.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Send a command and wait for its reply using the configured timeout
    pub async fn request(&self, command: &Command) -> Result<Envelope> {
        self.request_with_timeout(command, self.config().request_timeout)
            .await
    }

    /// Send a command and wait up to `timeout × command.timeout_multiple()` for its reply
    ///
    /// `timeout` is taken as given. The 5..=60 s range from
    /// [`check_request_timeout`](crate::config::check_request_timeout) only
    /// applies to the configured timeout used by [`request`](Self::request).
    pub async fn request_with_timeout(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Envelope> {
        if !self.is_listening() {
            return Err(ClientError::NotConnected);
        }

        let _in_flight = self.in_flight.lock().await;
        if !self.is_listening() {
            return Err(ClientError::NotConnected);
        }

        let Some(expected) = command.expected_reply() else {
            self.send(command).await?;
            return Ok(Envelope::empty_success());
        };

        let (reply, received) = oneshot::channel();
        *self.dispatcher.pending.lock() = Some(PendingSlot {
            method: expected.to_string(),
            user: command
                .requester_scoped()
                .then(|| self.user().to_string()),
            reply,
        });

        if let Err(e) = self.send(command).await {
            self.dispatcher.pending.lock().take();
            return Err(e);
        }

        let waited = timeout * command.timeout_multiple();
        let outcome = tokio::time::timeout(waited, async {
            tokio::select! {
                reply = received => reply.ok(),
                _ = self.connection.closed() => None,
            }
        })
        .await;
        self.dispatcher.pending.lock().take();

        match outcome {
            Ok(Some(envelope)) => Ok(envelope),
            Ok(None) => Err(ClientError::Connection(format!(
                "Connection closed while waiting for '{expected}'"
            ))),
            Err(_) => {
                tracing::warn!("No '{}' reply from {} within {:?}", expected, self.ip(), waited);
                Err(ClientError::Timeout {
                    method: expected.to_string(),
                    waited,
                })
            }
        }
    }

    /// Write on a command connection; a failed write ends the session
    async fn send(&self, command: &Command) -> Result<Vec<u8>> {
        match self.connection.send(command).await {
            Ok(written) => Ok(written),
            Err(e) => {
                tracing::warn!("Failed to send {} to {}: {}", command, self.ip(), e);
                self.connection.disconnect().await;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for WamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WamClient")
            .field("connection", &self.connection)
            .field("user", &self.user())
            .finish()
    }
}
