//! Connection management
//!
//! A speaker shares one TCP stream between every connected client, and
//! writes on the stream a client listens on corrupt what it reads. So the
//! [`Connection`] keeps one persistent socket that is only read from, and
//! opens a fresh socket for every command it writes.
//!
//! ```text
//! Idle -> Connecting -> Connected -> Listening -> Disconnecting -> Idle
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use wam_api::{Command, Envelope};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::framer::ByteBuffer;
use crate::wire::encode_request;

/// Lifecycle of the persistent listen connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    /// Socket open, read loop not running
    Connected,
    Listening,
    Disconnecting,
}

/// Receives every envelope decoded by the read loop, in arrival order
pub type MessageHandler = Arc<dyn Fn(Envelope) + Send + Sync>;

/// Read side of the listen socket with its unframed bytes
#[derive(Debug)]
struct Reader {
    half: OwnedReadHalf,
    buffer: ByteBuffer,
}

struct Listener {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Option<Reader>>,
}

impl Listener {
    /// Stop the read loop and get the reader back if it was still healthy
    async fn stop(self) -> Option<Reader> {
        let _ = self.stop.send(());
        match self.handle.await {
            Ok(reader) => reader,
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::warn!("Read loop ended abnormally: {}", e);
                }
                None
            }
        }
    }
}

#[derive(Default)]
struct Session {
    reader: Option<Reader>,
    writer: Option<OwnedWriteHalf>,
    listener: Option<Listener>,
}

/// Persistent listen socket plus per-command sockets to one speaker
pub struct Connection {
    ip: String,
    config: ClientConfig,
    state: watch::Sender<ConnectionState>,
    session: Mutex<Session>,
}

impl Connection {
    pub fn new(ip: impl Into<String>, config: ClientConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            ip: ip.into(),
            config,
            state,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn address(&self) -> String {
        format!("{}:{}", self.ip, self.config.port)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Resolves once the connection is back to [`ConnectionState::Idle`]
    pub async fn closed(&self) {
        let mut changes = self.state.subscribe();
        let _ = changes.wait_for(|state| *state == ConnectionState::Idle).await;
    }

    /// Open the listen socket using the configured timeout
    pub async fn connect(&self) -> Result<()> {
        self.connect_with_timeout(self.config.connect_timeout).await
    }

    pub async fn connect_with_timeout(&self, timeout: Duration) -> Result<()> {
        let mut refused = None;
        self.state.send_if_modified(|state| match state {
            ConnectionState::Idle => {
                *state = ConnectionState::Connecting;
                true
            }
            ConnectionState::Connecting => {
                refused = Some(ClientError::AlreadyConnecting);
                false
            }
            ConnectionState::Connected | ConnectionState::Listening => {
                refused = Some(ClientError::AlreadyConnected);
                false
            }
            ConnectionState::Disconnecting => {
                refused = Some(ClientError::Disconnecting);
                false
            }
        });
        if let Some(error) = refused {
            return Err(error);
        }

        let address = self.address();
        tracing::debug!("Connecting to {}", address);

        let stream = match open(&address, timeout).await {
            Ok(stream) => stream,
            Err(e) => {
                self.state.send_replace(ConnectionState::Idle);
                tracing::info!("Failed to connect to {}: {}", address, e);
                return Err(e);
            }
        };

        let mut session = self.session.lock().await;
        let committed = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        });
        if !committed {
            return Err(ClientError::Connection(format!(
                "Connection to {address} was closed while connecting"
            )));
        }

        let (half, writer) = stream.into_split();
        session.reader = Some(Reader {
            half,
            buffer: ByteBuffer::new(self.config.max_buffer_size),
        });
        session.writer = Some(writer);

        tracing::info!("Connected to speaker at {}", address);
        Ok(())
    }

    /// Start the background read loop, replacing any loop already running
    pub async fn start_listening(self: &Arc<Self>, handler: MessageHandler) -> Result<()> {
        let previous = self.session.lock().await.listener.take();
        if let Some(previous) = previous {
            tracing::debug!("Replacing read loop for {}", self.ip);
            if let Some(reader) = previous.stop().await {
                self.session.lock().await.reader = Some(reader);
            }
        }

        let mut session = self.session.lock().await;
        if !matches!(
            self.state(),
            ConnectionState::Connected | ConnectionState::Listening
        ) {
            return Err(ClientError::NotConnected);
        }
        let Some(reader) = session.reader.take() else {
            return Err(ClientError::NotConnected);
        };

        let (stop, stopped) = oneshot::channel();
        self.state.send_replace(ConnectionState::Listening);
        let handle = tokio::spawn(read_loop(
            Arc::clone(self),
            reader,
            stopped,
            handler,
            self.config.read_chunk_size,
        ));
        session.listener = Some(Listener { stop, handle });

        tracing::debug!("Listening to {}", self.ip);
        Ok(())
    }

    /// Stop the read loop and keep the socket open
    pub async fn stop_listening(&self) {
        let listener = self.session.lock().await.listener.take();
        let Some(listener) = listener else {
            return;
        };

        if let Some(reader) = listener.stop().await {
            let mut session = self.session.lock().await;
            session.reader = Some(reader);
            self.state.send_if_modified(|state| {
                if *state == ConnectionState::Listening {
                    *state = ConnectionState::Connected;
                    true
                } else {
                    false
                }
            });
            tracing::debug!("Stopped listening to {}", self.ip);
        }
    }

    /// Stop listening and close the socket; safe to call at any time
    pub async fn disconnect(&self) {
        let proceed = self.state.send_if_modified(|state| match state {
            ConnectionState::Idle | ConnectionState::Disconnecting => false,
            _ => {
                *state = ConnectionState::Disconnecting;
                true
            }
        });
        if !proceed {
            return;
        }

        let listener = self.session.lock().await.listener.take();
        if let Some(listener) = listener {
            listener.stop().await;
        }

        let mut session = self.session.lock().await;
        session.reader = None;
        if let Some(mut writer) = session.writer.take() {
            let _ = writer.shutdown().await;
        }
        drop(session);

        self.state.send_replace(ConnectionState::Idle);
        tracing::info!("Disconnected from speaker at {}", self.ip);
    }

    /// Write one command on a new socket and close it
    ///
    /// Returns the bytes written.
    pub async fn send(&self, command: &Command) -> Result<Vec<u8>> {
        let address = self.address();
        let request = encode_request(command, &self.ip, &self.config);

        let mut stream = open(&address, self.config.connect_timeout).await?;
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;
        let _ = stream.shutdown().await;

        tracing::debug!("Sent {} to {} ({} bytes)", command, address, request.len());
        Ok(request.into_bytes())
    }

    /// Called by the read loop when the socket failed or was closed by the speaker
    async fn read_loop_ended(&self) {
        let mut session = self.session.lock().await;
        let tearing_down = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Listening {
                *state = ConnectionState::Disconnecting;
                true
            } else {
                false
            }
        });
        if !tearing_down {
            // disconnect() or stop_listening() owns the teardown
            return;
        }

        session.listener = None;
        session.reader = None;
        if let Some(mut writer) = session.writer.take() {
            let _ = writer.shutdown().await;
        }
        drop(session);

        self.state.send_replace(ConnectionState::Idle);
        tracing::info!("Lost connection to speaker at {}", self.ip);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("ip", &self.ip)
            .field("port", &self.config.port)
            .field("state", &self.state())
            .finish()
    }
}

async fn open(address: &str, timeout: Duration) -> Result<TcpStream> {
    match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(ClientError::Connection(format!(
            "Failed to connect to {address}: {e}"
        ))),
        Err(_) => Err(ClientError::ConnectionTimeout {
            address: address.to_string(),
            timeout,
        }),
    }
}

async fn read_loop(
    connection: Arc<Connection>,
    mut reader: Reader,
    mut stop: oneshot::Receiver<()>,
    handler: MessageHandler,
    chunk_size: usize,
) -> Option<Reader> {
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let read = tokio::select! {
            _ = &mut stop => None,
            read = reader.half.read(&mut chunk) => Some(read),
        };
        let Some(read) = read else {
            return Some(reader);
        };

        match read {
            Ok(0) => {
                tracing::info!("Speaker at {} closed the connection", connection.ip);
                break;
            }
            Ok(n) => {
                for body in reader.buffer.push(&chunk[..n]) {
                    let envelope = Envelope::decode(&body);
                    tracing::debug!("Received {} from {}", envelope.method, connection.ip);
                    let dispatched = std::panic::catch_unwind(AssertUnwindSafe(|| handler(envelope)));
                    if dispatched.is_err() {
                        tracing::error!("Message handler panicked, continuing");
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Read from {} failed: {}", connection.ip, e);
                break;
            }
        }
    }

    connection.read_loop_ended().await;
    None
}
