//! Connection manager: owns the relay connection of one session.
//!
//! [`ConnectionManager::connect`] performs the first open and returns a
//! [`ConnectionHandle`]. Behind the handle a single actor task owns the link,
//! the room membership, the typing tracker, and the message log; handle methods
//! only send it commands. Events of one room reach subscribers in relay order.

mod driver;

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    config::ClientConfig,
    credential::Credential,
    domain::{Message, MessageKind, TypingEntry, WorkspaceId},
    error::{AuthError, ConnectError, ConnectionClosed, SendError, TransportError},
    history::HistoryLoader,
    transport::Transport,
};

use driver::{Command, Driver};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(label)
    }
}

/// Published connection status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub last_error: Option<String>,
}

impl ConnectionStatus {
    fn new(state: ConnectionState) -> Self {
        Self {
            state,
            last_error: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Event delivered to a room subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The room's full log after a history seed (initial entry or resync)
    History(Vec<Message>),
    /// A live message, including the echo of the local user's own sends
    Message(Message),
    /// The set of remote typists changed
    Typing(Vec<TypingEntry>),
}

/// Point-in-time view of the active room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub workspace_id: WorkspaceId,
    pub joined: bool,
    pub messages: Vec<Message>,
    pub typists: Vec<TypingEntry>,
}

/// Stream of one room's events. Ends when the room is left.
#[derive(Debug)]
pub struct RoomSubscription {
    workspace_id: WorkspaceId,
    events: mpsc::UnboundedReceiver<RoomEvent>,
}

impl RoomSubscription {
    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RoomEvent> {
        self.events.try_recv().ok()
    }
}

/// Creates connections over an injected transport and history loader
pub struct ConnectionManager {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    history: Arc<dyn HistoryLoader>,
}

impl ConnectionManager {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        history: Arc<dyn HistoryLoader>,
    ) -> Self {
        Self {
            config,
            transport,
            history,
        }
    }

    /// Open the relay connection.
    ///
    /// A rejected credential fails with [`AuthError`]. Any other failure of the
    /// first attempt still yields a handle, in `Reconnecting` state.
    pub async fn connect(&self, credential: Credential) -> Result<ConnectionHandle, AuthError> {
        let id = ConnectionId::next();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::new(ConnectionState::Connecting));
        tracing::info!("[{}] Connecting to relay as '{}'", id, credential.user_id);

        let opened = tokio::time::timeout(
            self.config.connect_timeout,
            self.transport.open(&credential.token),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ConnectError::Transport(TransportError::Timeout(
                self.config.connect_timeout,
            )))
        });

        let opened = match opened {
            Ok(link) => Ok(link),
            Err(ConnectError::Auth(e)) => {
                tracing::error!("[{}] Relay rejected the credential: {}", id, e);
                status_tx.send_replace(ConnectionStatus {
                    state: ConnectionState::Disconnected,
                    last_error: Some(e.to_string()),
                });
                return Err(e);
            }
            Err(ConnectError::Transport(e)) => {
                tracing::warn!("[{}] Initial connection failed: {}", id, e);
                Err(e)
            }
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let driver = Driver::new(self, id, credential, status_tx, command_rx, opened);
        tokio::spawn(driver.run());

        Ok(ConnectionHandle {
            id,
            commands: command_tx,
            status: status_rx,
        })
    }
}

/// Caller-side handle of a relay connection.
///
/// Dropping the handle tears the connection down like [`ConnectionHandle::disconnect`].
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Receiver of every status transition
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Make `workspace_id` the active room, leaving the previous one.
    ///
    /// Issued before the connection is up, the join is carried out once it
    /// reaches `Connected`.
    pub fn join_room(&self, workspace_id: WorkspaceId) -> Result<RoomSubscription, ConnectionClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.command(Command::Join {
            workspace_id: workspace_id.clone(),
            listener: tx,
        })?;
        Ok(RoomSubscription {
            workspace_id,
            events: rx,
        })
    }

    /// Leave `workspace_id` and close every subscription of it
    pub fn leave_room(&self, workspace_id: WorkspaceId) -> Result<(), ConnectionClosed> {
        self.command(Command::Leave { workspace_id })
    }

    /// Submit a message to the active room. Only local validation is awaited;
    /// the message shows up through the relay echo.
    pub async fn send(&self, content: impl Into<String>, kind: MessageKind) -> Result<(), SendError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Send {
            content: content.into(),
            kind,
            reply,
        })?;
        response.await.map_err(|_| ConnectionClosed)?
    }

    /// The input changed to `input` (localStartTyping)
    pub fn key_input(&self, input: impl Into<String>) -> Result<(), ConnectionClosed> {
        self.command(Command::Keystroke {
            input: input.into(),
        })
    }

    /// The input lost focus (localStopTyping)
    pub fn stop_typing(&self) -> Result<(), ConnectionClosed> {
        self.command(Command::StopTyping)
    }

    pub async fn snapshot(&self) -> Result<Option<RoomSnapshot>, ConnectionClosed> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Snapshot { reply })?;
        response.await.map_err(|_| ConnectionClosed)
    }

    /// Leave the active room and close the connection. Idempotent.
    pub async fn disconnect(&self) {
        let (done, finished) = oneshot::channel();
        if self.command(Command::Disconnect { done }).is_ok() {
            let _ = finished.await;
        }
    }

    fn command(&self, command: Command) -> Result<(), ConnectionClosed> {
        self.commands.send(command).map_err(|_| ConnectionClosed)
    }
}
