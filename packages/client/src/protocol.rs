//! Conversion between wire DTOs and domain entities.

use huddle_shared::protocol::{
    self as dto, ClientEvent, MessagePayload, SendMessagePayload, ServerEvent, WorkspaceRef,
};

use crate::domain::{
    Message, MessageId, MessageKind, Timestamp, UserId, ValueObjectError, WorkspaceId,
};

/// Inbound relay event after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    NewMessage(Message),
    UserTyping {
        user_id: UserId,
        user_name: String,
        workspace_id: Option<WorkspaceId>,
    },
    UserStoppedTyping {
        user_id: UserId,
        workspace_id: Option<WorkspaceId>,
    },
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<MessagePayload> for Message {
    type Error = ValueObjectError;

    fn try_from(dto: MessagePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(dto.id)?,
            workspace_id: WorkspaceId::new(dto.workspace_id)?,
            sender_id: UserId::new(dto.sender_id)?,
            sender_name: dto.sender_name,
            content: dto.content,
            kind: MessageKind::from(dto.kind),
            timestamp: Timestamp::new(dto.timestamp),
            edited: dto.edited,
        })
    }
}

impl TryFrom<ServerEvent> for RelayEvent {
    type Error = ValueObjectError;

    fn try_from(event: ServerEvent) -> Result<Self, Self::Error> {
        Ok(match event {
            ServerEvent::NewMessage(payload) => Self::NewMessage(payload.try_into()?),
            ServerEvent::UserTyping(dto::UserTypingPayload {
                user_id,
                user_name,
                workspace_id,
            }) => Self::UserTyping {
                user_id: UserId::new(user_id)?,
                user_name,
                workspace_id: workspace_id.map(WorkspaceId::new).transpose()?,
            },
            ServerEvent::UserStoppedTyping(dto::UserStoppedTypingPayload {
                user_id,
                workspace_id,
            }) => Self::UserStoppedTyping {
                user_id: UserId::new(user_id)?,
                workspace_id: workspace_id.map(WorkspaceId::new).transpose()?,
            },
        })
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Message> for MessagePayload {
    fn from(model: &Message) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            workspace_id: model.workspace_id.as_str().to_string(),
            sender_id: model.sender_id.as_str().to_string(),
            sender_name: model.sender_name.clone(),
            content: model.content.clone(),
            kind: model.kind.as_str().to_string(),
            timestamp: model.timestamp.value(),
            edited: model.edited,
        }
    }
}

pub fn join_workspace(workspace_id: &WorkspaceId) -> ClientEvent {
    ClientEvent::JoinWorkspace(WorkspaceRef::new(workspace_id.as_str()))
}

pub fn leave_workspace(workspace_id: &WorkspaceId) -> ClientEvent {
    ClientEvent::LeaveWorkspace(WorkspaceRef::new(workspace_id.as_str()))
}

pub fn typing_start(workspace_id: &WorkspaceId) -> ClientEvent {
    ClientEvent::TypingStart(WorkspaceRef::new(workspace_id.as_str()))
}

pub fn typing_stop(workspace_id: &WorkspaceId) -> ClientEvent {
    ClientEvent::TypingStop(WorkspaceRef::new(workspace_id.as_str()))
}

pub fn send_message(workspace_id: &WorkspaceId, content: &str, kind: &MessageKind) -> ClientEvent {
    ClientEvent::SendMessage(SendMessagePayload {
        workspace_id: workspace_id.as_str().to_string(),
        message: content.to_string(),
        kind: kind.as_str().to_string(),
    })
}
