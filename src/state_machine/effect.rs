//! Effects produced by state transitions

use crate::db::AppRecord;
use crate::telegram::{MessageId, OutgoingMessage, ReplyMarkup};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a message to the originating chat
    Reply(OutgoingMessage),

    /// Forward an uploaded message to the broadcast target
    ForwardToGroup { message_id: MessageId },

    /// One message per visible account, each with a delete button
    SendUserDetails,

    /// Aggregate list of accounts and hosts
    SendUserList,

    /// Aggregate list of hosts
    SendHostUsers,

    /// One message per published listing, each with a delete button
    SendPublishedApps,

    /// One message per published listing, each with a sync button
    SendSyncableApps,

    /// Clear the sync target
    StopSync,

    /// Append a finished listing to the catalog and announce it
    CommitApp { record: AppRecord },

    DeleteUser { nickname: String },

    DeleteApp { name: String },

    SyncApp { name: String },

    /// Acknowledge an inline button press
    AnswerCallback { query_id: String },
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply(OutgoingMessage::plain(text))
    }

    pub fn reply_with_markup(text: impl Into<String>, markup: ReplyMarkup) -> Self {
        Effect::Reply(OutgoingMessage::plain(text).with_markup(markup))
    }
}
