//! Interactive client session.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    config::ClientConfig,
    connection::{ConnectionHandle, ConnectionManager, ConnectionState, RoomEvent, RoomSubscription},
    credential::Credential,
    domain::{Message, MessageKind, UserId, WorkspaceId},
    error::ClientError,
    history::HttpHistoryLoader,
    transport::WebSocketTransport,
};

use super::{
    formatter::{MessageFormatter, format_room_entered, format_status, format_typing},
    input::{InputCommand, InputEvent, spawn_line_reader},
    prompt::{prompt_label, redisplay_prompt},
};

/// Display state of the room shown in the terminal
struct RoomView {
    subscription: RoomSubscription,
    log: Vec<Message>,
}

impl RoomView {
    fn new(subscription: RoomSubscription) -> Self {
        Self {
            subscription,
            log: Vec::new(),
        }
    }

    /// Render one room event and update the local log
    fn render(&mut self, event: RoomEvent, formatter: &MessageFormatter, me: &UserId) -> Option<String> {
        match event {
            RoomEvent::History(messages) => {
                let output = formatter.format_history(&messages, me);
                self.log = messages;
                Some(output)
            }
            RoomEvent::Message(message) => {
                let output = formatter.format_live(&message, self.log.last(), me);
                self.log.push(message);
                Some(output)
            }
            RoomEvent::Typing(typists) => format_typing(&typists),
        }
    }
}

/// Run the interactive client until `/quit`, Ctrl+C, or a terminal connection failure
pub async fn run_client(
    config: ClientConfig,
    credential: Credential,
    workspace: Option<WorkspaceId>,
) -> Result<(), ClientError> {
    config.validate()?;

    let transport = Arc::new(WebSocketTransport::new(config.relay_url.clone()));
    let history = Arc::new(HttpHistoryLoader::new(config.api_base_url.clone()));
    let me = credential.user_id.clone();
    let manager = ConnectionManager::new(config, transport, history);
    let handle = manager.connect(credential).await?;

    let result = run_session(&handle, &me, workspace).await;
    handle.disconnect().await;
    result
}

async fn run_session(
    handle: &ConnectionHandle,
    me: &UserId,
    workspace: Option<WorkspaceId>,
) -> Result<(), ClientError> {
    let formatter = MessageFormatter::new();
    let mut status = handle.subscribe_status();
    let (prompt_tx, prompt_rx) = watch::channel(prompt_label(me, workspace.as_ref()));
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    let mut room = match workspace {
        Some(workspace_id) => {
            print!("{}", format_room_entered(&workspace_id));
            Some(RoomView::new(handle.join_room(workspace_id)?))
        }
        None => None,
    };

    println!(
        "\nYou are '{}'. Type messages and press Enter to send. \
         `/join <workspace>` switches workspace, `/quit` exits.",
        me
    );
    print!("{}", format_status(&status.borrow_and_update()));
    let _reader = spawn_line_reader(input_tx, prompt_rx);

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    return Err(ClientError::ConnectionLost("connection task ended".to_string()));
                }
                let current = status.borrow_and_update().clone();
                print!("{}", format_status(&current));
                redisplay_prompt(&prompt_tx.borrow());
                if current.state == ConnectionState::Disconnected {
                    let reason = current
                        .last_error
                        .unwrap_or_else(|| "disconnected".to_string());
                    return Err(ClientError::ConnectionLost(reason));
                }
            }
            event = next_room_event(&mut room) => match event {
                Some(event) => {
                    if let Some(view) = &mut room
                        && let Some(output) = view.render(event, &formatter, me)
                    {
                        print!("{}", output);
                        redisplay_prompt(&prompt_tx.borrow());
                    }
                }
                None => room = None,
            },
            input = input_rx.recv() => match input {
                Some(InputEvent::Edited(line)) => {
                    if room.is_some() {
                        handle.key_input(line)?;
                    }
                }
                Some(InputEvent::Submitted(line)) => match InputCommand::parse(&line) {
                    InputCommand::Quit => return Ok(()),
                    InputCommand::Join(workspace_id) => match WorkspaceId::new(workspace_id) {
                        Ok(workspace_id) => {
                            prompt_tx.send_replace(prompt_label(me, Some(&workspace_id)));
                            print!("{}", format_room_entered(&workspace_id));
                            room = Some(RoomView::new(handle.join_room(workspace_id)?));
                        }
                        Err(e) => println!("{}", e),
                    },
                    InputCommand::Say(text) => {
                        if !status.borrow().is_connected() {
                            println!("(offline) message not sent; waiting for the relay");
                        } else if let Err(e) = handle.send(text, MessageKind::Text).await {
                            println!("message not sent: {}", e);
                        }
                    }
                    InputCommand::Invalid(hint) => println!("{}", hint),
                },
                Some(InputEvent::Closed) | None => return Ok(()),
            },
        }
    }
}

async fn next_room_event(room: &mut Option<RoomView>) -> Option<RoomEvent> {
    match room {
        Some(view) => view.subscription.recv().await,
        None => std::future::pending().await,
    }
}
