//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::catalog::CatalogSnapshot;
use crate::db::{AppRecord, Database, UserAccount};
use crate::telegram::{
    ApiError, ChatId, Message, MessageId, OutgoingMessage, TelegramClient, Update,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Bot API surface the runtime depends on
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Fetch updates with id >= `offset`
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ApiError>;

    async fn send_message(
        &self,
        chat_id: ChatId,
        message: &OutgoingMessage,
    ) -> Result<Message, ApiError>;

    async fn forward_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<Message, ApiError>;

    async fn answer_callback(&self, query_id: &str) -> Result<(), ApiError>;
}

/// Storage for the store's catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load_snapshot(&self) -> Result<CatalogSnapshot, String>;

    async fn save_apps(&self, apps: &[AppRecord]) -> Result<(), String>;

    async fn save_accounts(&self, accounts: &[UserAccount]) -> Result<(), String>;

    async fn save_banned(&self, banned: &[String]) -> Result<(), String>;

    async fn save_hosts(&self, hosts: &[String]) -> Result<(), String>;

    /// `None` clears the signed-in account
    async fn save_active_user(&self, nickname: Option<&str>) -> Result<(), String>;

    async fn save_operator_chat(&self, chat_id: ChatId) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: BotApi + ?Sized> BotApi for Arc<T> {
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ApiError> {
        (**self).get_updates(offset).await
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        message: &OutgoingMessage,
    ) -> Result<Message, ApiError> {
        (**self).send_message(chat_id, message).await
    }

    async fn forward_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<Message, ApiError> {
        (**self)
            .forward_message(chat_id, from_chat_id, message_id)
            .await
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), ApiError> {
        (**self).answer_callback(query_id).await
    }
}

#[async_trait]
impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    async fn load_snapshot(&self) -> Result<CatalogSnapshot, String> {
        (**self).load_snapshot().await
    }

    async fn save_apps(&self, apps: &[AppRecord]) -> Result<(), String> {
        (**self).save_apps(apps).await
    }

    async fn save_accounts(&self, accounts: &[UserAccount]) -> Result<(), String> {
        (**self).save_accounts(accounts).await
    }

    async fn save_banned(&self, banned: &[String]) -> Result<(), String> {
        (**self).save_banned(banned).await
    }

    async fn save_hosts(&self, hosts: &[String]) -> Result<(), String> {
        (**self).save_hosts(hosts).await
    }

    async fn save_active_user(&self, nickname: Option<&str>) -> Result<(), String> {
        (**self).save_active_user(nickname).await
    }

    async fn save_operator_chat(&self, chat_id: ChatId) -> Result<(), String> {
        (**self).save_operator_chat(chat_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ApiError> {
        TelegramClient::get_updates(self, offset).await
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        message: &OutgoingMessage,
    ) -> Result<Message, ApiError> {
        TelegramClient::send_message(self, chat_id, message).await
    }

    async fn forward_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<Message, ApiError> {
        TelegramClient::forward_message(self, chat_id, from_chat_id, message_id).await
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), ApiError> {
        self.answer_callback_query(query_id).await.map(|_| ())
    }
}

/// Adapter to use Database as a `CatalogStore`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for DatabaseStorage {
    async fn load_snapshot(&self) -> Result<CatalogSnapshot, String> {
        let load = || -> crate::db::DbResult<CatalogSnapshot> {
            Ok(CatalogSnapshot {
                accounts: self.db.load_accounts()?,
                apps: self.db.load_apps()?,
                banned: self.db.load_banned_users()?,
                hosts: self.db.load_host_users()?,
                current_user: self.db.load_current_user()?,
                operator_chat: self.db.load_admin_chat_id()?,
            })
        };
        load().map_err(|e| e.to_string())
    }

    async fn save_apps(&self, apps: &[AppRecord]) -> Result<(), String> {
        self.db.save_apps(apps).map_err(|e| e.to_string())
    }

    async fn save_accounts(&self, accounts: &[UserAccount]) -> Result<(), String> {
        self.db.save_accounts(accounts).map_err(|e| e.to_string())
    }

    async fn save_banned(&self, banned: &[String]) -> Result<(), String> {
        self.db.save_banned_users(banned).map_err(|e| e.to_string())
    }

    async fn save_hosts(&self, hosts: &[String]) -> Result<(), String> {
        self.db.save_host_users(hosts).map_err(|e| e.to_string())
    }

    async fn save_active_user(&self, nickname: Option<&str>) -> Result<(), String> {
        match nickname {
            Some(nickname) => self.db.save_current_user(nickname),
            None => self.db.clear_current_user(),
        }
        .map_err(|e| e.to_string())
    }

    async fn save_operator_chat(&self, chat_id: ChatId) -> Result<(), String> {
        self.db.save_admin_chat_id(chat_id).map_err(|e| e.to_string())
    }
}
