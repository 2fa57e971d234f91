//! Connection actor.
//!
//! One task per connection. Every command, relay event, timer, and history
//! result is handled to completion before the next one is taken.

use std::{future, sync::Arc};

use huddle_shared::protocol::{ClientEvent, ServerEvent};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};

use crate::{
    channel::MessageChannel,
    config::ClientConfig,
    credential::Credential,
    domain::{Message, MessageKind, WorkspaceId},
    error::{ConnectError, HistoryFetchError, SendError, TransportError},
    history::HistoryLoader,
    listener::Listeners,
    membership::{JoinOutcome, MembershipChange, RoomMembership},
    protocol::{RelayEvent, typing_start, typing_stop},
    transport::{Transport, TransportLink},
    typing::{TypingSignal, TypingTracker},
};

use super::{
    ConnectionId, ConnectionManager, ConnectionState, ConnectionStatus, RoomEvent, RoomSnapshot,
};

pub(crate) enum Command {
    Join {
        workspace_id: WorkspaceId,
        listener: mpsc::UnboundedSender<RoomEvent>,
    },
    Leave {
        workspace_id: WorkspaceId,
    },
    Send {
        content: String,
        kind: MessageKind,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
    Keystroke {
        input: String,
    },
    StopTyping,
    Snapshot {
        reply: oneshot::Sender<Option<RoomSnapshot>>,
    },
    Disconnect {
        done: oneshot::Sender<()>,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Join { .. } => "Join",
            Self::Leave { .. } => "Leave",
            Self::Send { .. } => "Send",
            Self::Keystroke { .. } => "Keystroke",
            Self::StopTyping => "StopTyping",
            Self::Snapshot { .. } => "Snapshot",
            Self::Disconnect { .. } => "Disconnect",
        };
        f.write_str(name)
    }
}

struct HistoryResult {
    generation: u64,
    result: Result<Vec<Message>, HistoryFetchError>,
}

struct OpenResult {
    ticket: u64,
    result: Result<TransportLink, ConnectError>,
}

/// Reconnection attempt running outside the actor
struct PendingOpen {
    ticket: u64,
    task: JoinHandle<()>,
}

/// State of the room the user asked to be in
struct ActiveRoom {
    workspace_id: WorkspaceId,
    channel: MessageChannel,
    listeners: Listeners<RoomEvent>,
    /// Generation of the history fetch this room is waiting for
    pending_history: Option<u64>,
}

impl ActiveRoom {
    fn new(workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id,
            channel: MessageChannel::new(),
            listeners: Listeners::new(),
            pending_history: None,
        }
    }
}

pub(crate) struct Driver {
    id: ConnectionId,
    credential: Credential,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    history: Arc<dyn HistoryLoader>,
    status: watch::Sender<ConnectionStatus>,
    commands: mpsc::UnboundedReceiver<Command>,
    link: Option<TransportLink>,
    membership: RoomMembership,
    room: Option<ActiveRoom>,
    typing: TypingTracker,
    /// Failed reconnection attempts since the last successful open
    attempt: u32,
    retry_at: Option<Instant>,
    history_tx: mpsc::UnboundedSender<HistoryResult>,
    history_rx: mpsc::UnboundedReceiver<HistoryResult>,
    generation: u64,
    pending_open: Option<PendingOpen>,
    open_tx: mpsc::UnboundedSender<OpenResult>,
    open_rx: mpsc::UnboundedReceiver<OpenResult>,
    open_tickets: u64,
}

impl Driver {
    pub(crate) fn new(
        manager: &ConnectionManager,
        id: ConnectionId,
        credential: Credential,
        status: watch::Sender<ConnectionStatus>,
        commands: mpsc::UnboundedReceiver<Command>,
        opened: Result<TransportLink, TransportError>,
    ) -> Self {
        let config = manager.config.clone();
        let typing = TypingTracker::new(
            credential.user_id.clone(),
            config.typing_idle,
            config.remote_typing_ttl,
        );
        let (history_tx, history_rx) = mpsc::unbounded_channel();
        let (open_tx, open_rx) = mpsc::unbounded_channel();

        let mut driver = Self {
            id,
            credential,
            config,
            transport: manager.transport.clone(),
            history: manager.history.clone(),
            status,
            commands,
            link: None,
            membership: RoomMembership::new(),
            room: None,
            typing,
            attempt: 0,
            retry_at: None,
            history_tx,
            history_rx,
            generation: 0,
            pending_open: None,
            open_tx,
            open_rx,
            open_tickets: 0,
        };

        match opened {
            Ok(link) => driver.on_opened(link),
            Err(e) => {
                driver.set_status(ConnectionState::Reconnecting, Some(e.to_string()));
                driver.schedule_retry();
            }
        }
        driver
    }

    pub(crate) async fn run(mut self) {
        loop {
            let idle_deadline = self.typing.idle_deadline();
            let typing_expiry = self.typing.next_expiry();
            let retry_at = self.retry_at;

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Disconnect { done }) => {
                        self.shutdown();
                        let _ = done.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::debug!("[{}] Handle dropped", self.id);
                        self.shutdown();
                        break;
                    }
                },
                inbound = recv_inbound(&mut self.link) => match inbound {
                    Some(event) => self.handle_relay_event(event),
                    None => self.on_link_lost(),
                },
                Some(HistoryResult { generation, result }) = self.history_rx.recv() => {
                    self.on_history(generation, result);
                }
                _ = sleep_until_opt(idle_deadline) => self.on_idle_timeout(),
                _ = sleep_until_opt(typing_expiry) => self.on_typing_expiry(),
                Some(OpenResult { ticket, result }) = self.open_rx.recv() => {
                    self.on_open_result(ticket, result);
                }
                _ = sleep_until_opt(retry_at) => self.start_reconnect(),
            }
        }
        tracing::info!("[{}] Connection closed", self.id);
    }

    // ========================================
    // Commands
    // ========================================

    fn handle_command(&mut self, command: Command) {
        tracing::debug!("[{}] Command {:?}", self.id, command);
        match command {
            Command::Join {
                workspace_id,
                listener,
            } => self.join(workspace_id, listener),
            Command::Leave { workspace_id } => {
                let connected = self.is_connected();
                match self.membership.leave(&workspace_id, connected) {
                    Some(change) => {
                        self.exit_room();
                        self.apply(change);
                        tracing::info!("[{}] Left room '{}'", self.id, workspace_id);
                    }
                    None => {
                        tracing::debug!("[{}] Not in room '{}', ignoring leave", self.id, workspace_id)
                    }
                }
            }
            Command::Send {
                content,
                kind,
                reply,
            } => {
                let result = self.send(&content, &kind);
                if let Err(e) = &result {
                    tracing::warn!("[{}] Message not sent: {}", self.id, e);
                }
                let _ = reply.send(result);
            }
            Command::Keystroke { input } => {
                if self.membership.joined_room().is_none() {
                    return;
                }
                let signal = self.typing.local_keystroke(&input, Instant::now());
                self.emit_typing(signal);
            }
            Command::StopTyping => {
                let signal = self.typing.local_stop();
                self.emit_typing(signal);
            }
            Command::Snapshot { reply } => {
                let snapshot = self.room.as_ref().map(|room| RoomSnapshot {
                    workspace_id: room.workspace_id.clone(),
                    joined: self.membership.joined_room().is_some(),
                    messages: room.channel.messages().to_vec(),
                    typists: self.typing.active_typists().to_vec(),
                });
                let _ = reply.send(snapshot);
            }
            Command::Disconnect { done } => {
                self.shutdown();
                let _ = done.send(());
            }
        }
    }

    fn join(&mut self, workspace_id: WorkspaceId, listener: mpsc::UnboundedSender<RoomEvent>) {
        let connected = self.is_connected();
        match self.membership.join(workspace_id.clone(), connected) {
            JoinOutcome::AlreadyActive => {
                if let Some(room) = &mut self.room {
                    room.listeners.attach(listener);
                    if !room.channel.awaiting_history() {
                        let history = RoomEvent::History(room.channel.messages().to_vec());
                        room.listeners.emit_latest(history);
                    }
                }
            }
            JoinOutcome::Switched { previous, change } => {
                self.exit_room();
                if let Some(previous) = previous {
                    tracing::info!("[{}] Switching room '{}' -> '{}'", self.id, previous, workspace_id);
                }
                let mut room = ActiveRoom::new(workspace_id.clone());
                room.listeners.attach(listener);
                self.room = Some(room);
                self.apply(change);
                tracing::info!("[{}] Active room is now '{}'", self.id, workspace_id);
            }
        }
    }

    fn send(&mut self, content: &str, kind: &MessageKind) -> Result<(), SendError> {
        if !self.is_connected() {
            return Err(SendError::NotConnected);
        }
        let workspace_id = self
            .membership
            .joined_room()
            .cloned()
            .ok_or(SendError::NoActiveRoom)?;
        let event = MessageChannel::compose(&workspace_id, content, kind)?;
        self.emit(event);
        let signal = self.typing.local_stop();
        self.emit_typing(signal);
        Ok(())
    }

    // ========================================
    // Relay events
    // ========================================

    fn handle_relay_event(&mut self, event: ServerEvent) {
        let event = match RelayEvent::try_from(event) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("[{}] Dropping malformed relay event: {}", self.id, e);
                return;
            }
        };
        let Some(room) = &mut self.room else {
            tracing::debug!("[{}] No active room, dropping {:?}", self.id, event);
            return;
        };

        match event {
            RelayEvent::NewMessage(message) => {
                if message.workspace_id != room.workspace_id {
                    tracing::debug!(
                        "[{}] Dropping message {} for stale room '{}'",
                        self.id,
                        message.id,
                        message.workspace_id
                    );
                    return;
                }
                if let Some(message) = room.channel.receive(message) {
                    room.listeners.emit(&RoomEvent::Message(message));
                }
            }
            RelayEvent::UserTyping {
                user_id,
                user_name,
                workspace_id,
            } => {
                if is_stale(workspace_id.as_ref(), &room.workspace_id) {
                    tracing::debug!("[{}] Dropping typing of '{}' for stale room", self.id, user_id);
                    return;
                }
                if self.typing.on_typing_start(user_id, user_name, Instant::now()) {
                    room.listeners
                        .emit(&RoomEvent::Typing(self.typing.active_typists().to_vec()));
                }
            }
            RelayEvent::UserStoppedTyping {
                user_id,
                workspace_id,
            } => {
                if is_stale(workspace_id.as_ref(), &room.workspace_id) {
                    return;
                }
                if self.typing.on_typing_stop(&user_id) {
                    room.listeners
                        .emit(&RoomEvent::Typing(self.typing.active_typists().to_vec()));
                }
            }
        }
    }

    fn on_history(&mut self, generation: u64, result: Result<Vec<Message>, HistoryFetchError>) {
        let Some(room) = &mut self.room else {
            return;
        };
        if room.pending_history != Some(generation) {
            tracing::debug!("[{}] Discarding stale history result", self.id);
            return;
        }
        room.pending_history = None;

        let history = result.unwrap_or_else(|e| {
            tracing::warn!(
                "[{}] History fetch for '{}' failed, continuing with empty history: {}",
                self.id,
                room.workspace_id,
                e
            );
            Vec::new()
        });
        let seeded = room.channel.seed_history(history);
        tracing::debug!(
            "[{}] Seeded '{}' with {} messages",
            self.id,
            room.workspace_id,
            seeded.history.len()
        );
        room.listeners.emit(&RoomEvent::History(seeded.history));
        for message in seeded.live {
            room.listeners.emit(&RoomEvent::Message(message));
        }
    }

    // ========================================
    // Timers
    // ========================================

    fn on_idle_timeout(&mut self) {
        let signal = self.typing.poll_idle(Instant::now());
        self.emit_typing(signal);
    }

    fn on_typing_expiry(&mut self) {
        if self.typing.expire(Instant::now()) {
            self.notify_typists();
        }
    }

    // ========================================
    // Connectivity
    // ========================================

    fn on_opened(&mut self, link: TransportLink) {
        self.link = Some(link);
        self.attempt = 0;
        self.retry_at = None;
        self.set_status(ConnectionState::Connected, None);
        let change = self.membership.on_connected();
        self.apply(change);
    }

    fn on_link_lost(&mut self) {
        tracing::warn!("[{}] Lost connection to relay", self.id);
        self.link = None;
        self.membership.on_disconnected();
        self.typing.local_stop();
        if self.typing.clear_remote() {
            self.notify_typists();
        }
        self.set_status(
            ConnectionState::Reconnecting,
            Some(TransportError::Closed.to_string()),
        );
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        if !self.config.reconnect.allows(self.attempt) {
            tracing::error!("[{}] Giving up after {} attempts", self.id, self.attempt);
            self.retry_at = None;
            self.set_status(
                ConnectionState::Disconnected,
                Some(TransportError::RetriesExhausted(self.attempt).to_string()),
            );
            return;
        }
        let delay = self.config.reconnect.delay_for(self.attempt);
        self.attempt += 1;
        self.retry_at = Some(Instant::now() + delay);
        tracing::info!(
            "[{}] Reconnecting in {:?} (attempt {})",
            self.id,
            delay,
            self.attempt
        );
    }

    /// Open a new link in the background; the result comes back through `open_rx`
    fn start_reconnect(&mut self) {
        self.retry_at = None;
        self.open_tickets += 1;
        let ticket = self.open_tickets;

        let transport = self.transport.clone();
        let token = self.credential.token.clone();
        let timeout = self.config.connect_timeout;
        let results = self.open_tx.clone();
        let task = tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, transport.open(&token))
                .await
                .unwrap_or_else(|_| Err(ConnectError::Transport(TransportError::Timeout(timeout))));
            let _ = results.send(OpenResult { ticket, result });
        });
        self.pending_open = Some(PendingOpen { ticket, task });
    }

    fn on_open_result(&mut self, ticket: u64, result: Result<TransportLink, ConnectError>) {
        if self.pending_open.as_ref().map(|pending| pending.ticket) != Some(ticket) {
            tracing::debug!("[{}] Dropping result of abandoned attempt {}", self.id, ticket);
            return;
        }
        self.pending_open = None;

        match result {
            Ok(link) => {
                tracing::info!("[{}] Reconnected to relay", self.id);
                self.on_opened(link);
            }
            Err(ConnectError::Auth(e)) => {
                tracing::error!("[{}] Relay rejected the credential, not retrying: {}", self.id, e);
                self.set_status(ConnectionState::Disconnected, Some(e.to_string()));
            }
            Err(ConnectError::Transport(e)) => {
                tracing::warn!("[{}] Reconnection attempt failed: {}", self.id, e);
                self.set_status(ConnectionState::Reconnecting, Some(e.to_string()));
                self.schedule_retry();
            }
        }
    }

    /// Unmount: leave the active room, then close the link
    fn shutdown(&mut self) {
        let connected = self.is_connected();
        if let Some(change) = self.membership.leave_active(connected) {
            self.exit_room();
            self.apply(change);
        }
        self.link = None;
        self.retry_at = None;
        if let Some(pending) = self.pending_open.take() {
            pending.task.abort();
        }
        self.set_status(ConnectionState::Disconnected, None);
    }

    // ========================================
    // Helpers
    // ========================================

    /// Tear down room-scoped state: stop local typing, forget typists, close subscriptions
    fn exit_room(&mut self) {
        let was_typing = self.typing.local_stop().is_some();
        self.typing.clear_remote();
        if let Some(mut room) = self.room.take() {
            if was_typing {
                self.emit(typing_stop(&room.workspace_id));
            }
            room.listeners.clear();
        }
    }

    /// Put membership events on the wire and fetch history for an entered room
    fn apply(&mut self, change: MembershipChange) {
        for event in change.events() {
            self.emit(event);
        }
        if change.entered.is_some() {
            self.start_history_fetch();
        }
    }

    fn start_history_fetch(&mut self) {
        let Some(room) = &mut self.room else {
            return;
        };
        self.generation += 1;
        let generation = self.generation;
        room.pending_history = Some(generation);
        room.channel.begin_history();

        let loader = self.history.clone();
        let token = self.credential.token.clone();
        let workspace_id = room.workspace_id.clone();
        let results = self.history_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&workspace_id, &token).await;
            let _ = results.send(HistoryResult { generation, result });
        });
    }

    fn emit_typing(&mut self, signal: Option<TypingSignal>) {
        let Some(signal) = signal else {
            return;
        };
        let Some(workspace_id) = self.membership.joined_room().cloned() else {
            return;
        };
        let event = match signal {
            TypingSignal::Start => typing_start(&workspace_id),
            TypingSignal::Stop => typing_stop(&workspace_id),
        };
        self.emit(event);
    }

    fn emit(&self, event: ClientEvent) {
        match &self.link {
            Some(link) => {
                if link.outbound.send(event).is_err() {
                    tracing::debug!("[{}] Link closed while emitting", self.id);
                }
            }
            None => tracing::debug!("[{}] Not connected, dropping {}", self.id, event.name()),
        }
    }

    fn notify_typists(&mut self) {
        if let Some(room) = &mut self.room {
            room.listeners
                .emit(&RoomEvent::Typing(self.typing.active_typists().to_vec()));
        }
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    fn set_status(&self, state: ConnectionState, last_error: Option<String>) {
        let previous = self.status.borrow().state;
        if previous != state {
            tracing::info!("[{}] {} -> {}", self.id, previous, state);
        }
        self.status.send_replace(ConnectionStatus { state, last_error });
    }
}

async fn recv_inbound(link: &mut Option<TransportLink>) -> Option<ServerEvent> {
    match link {
        Some(link) => link.inbound.recv().await,
        None => future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Typing events from relays that omit the room are trusted
fn is_stale(tagged: Option<&WorkspaceId>, current: &WorkspaceId) -> bool {
    tagged.is_some_and(|workspace_id| workspace_id != current)
}
