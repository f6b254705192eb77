//! Events that can occur in a bot conversation

use crate::telegram::MessageId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A chat message
    Message {
        sender: Option<String>,
        input: MessageInput,
        message_id: MessageId,
    },
    /// An inline button was pressed
    ButtonPress {
        sender: Option<String>,
        payload: String,
        query_id: String,
    },
}

/// What a chat message carried, in the order it is inspected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageInput {
    Text(String),
    Document { file_id: String },
    Photo { file_id: String },
    /// Stickers, voice notes and anything else the flow never asks for
    Other,
}

/// Trigger phrases handled the same way at every step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    UserDetails,
    ListUsers,
    HostUsers,
    Publish,
    PublishedApps,
    SyncApps,
    Stop,
}

impl Command {
    /// Match trimmed text; only `/start` and `stop` ignore case
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            "User Details" => Some(Command::UserDetails),
            "List Users" => Some(Command::ListUsers),
            "Send all Host users" => Some(Command::HostUsers),
            "Publish" => Some(Command::Publish),
            "Published apps" => Some(Command::PublishedApps),
            "Sync Apps" => Some(Command::SyncApps),
            _ if text.eq_ignore_ascii_case("/start") => Some(Command::Start),
            _ if text.eq_ignore_ascii_case("stop") => Some(Command::Stop),
            _ => None,
        }
    }
}

const DELETE_USER_PREFIX: &str = "delete_user_";
const DELETE_APP_PREFIX: &str = "delete_app_";
const SYNC_APP_PREFIX: &str = "sync_app_";

/// Bot API limit on inline button `callback_data`, in bytes
pub const MAX_CALLBACK_DATA: usize = 64;

/// Decoded inline button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    DeleteUser(String),
    DeleteApp(String),
    SyncApp(String),
    Unknown,
}

impl ButtonAction {
    pub fn parse(payload: &str) -> Self {
        if let Some(name) = payload.strip_prefix(DELETE_USER_PREFIX) {
            ButtonAction::DeleteUser(name.to_string())
        } else if let Some(name) = payload.strip_prefix(DELETE_APP_PREFIX) {
            ButtonAction::DeleteApp(name.to_string())
        } else if let Some(name) = payload.strip_prefix(SYNC_APP_PREFIX) {
            ButtonAction::SyncApp(name.to_string())
        } else {
            ButtonAction::Unknown
        }
    }

    /// Callback payload that parses back into this action
    pub fn payload(&self) -> String {
        match self {
            ButtonAction::DeleteUser(name) => format!("{DELETE_USER_PREFIX}{name}"),
            ButtonAction::DeleteApp(name) => format!("{DELETE_APP_PREFIX}{name}"),
            ButtonAction::SyncApp(name) => format!("{SYNC_APP_PREFIX}{name}"),
            ButtonAction::Unknown => String::new(),
        }
    }

    /// The payload can be attached to an inline button
    pub fn fits_button(&self) -> bool {
        self.payload().len() <= MAX_CALLBACK_DATA
    }
}
