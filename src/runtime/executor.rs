//! Bot runtime executor

use super::traits::{BotApi, CatalogStore};

use crate::catalog::Catalog;
use crate::config::{BotConfig, SYSTEM_AUTHOR};
use crate::db::AppRecord;
use crate::state_machine::{
    transition, ButtonAction, ConvContext, ConvState, Effect, Event, MessageInput,
};
use crate::telegram::{
    escape_html, CallbackQuery, ChatId, Message, MessageId, OutgoingMessage, ReplyMarkup, Update,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Owns the catalog and every chat's conversation, and runs effects
/// against the Bot API and the store.
pub struct BotRuntime<A, S>
where
    A: BotApi + 'static,
    S: CatalogStore + 'static,
{
    config: BotConfig,
    api: Arc<A>,
    store: S,
    catalog: Catalog,
    conversations: HashMap<ChatId, ConvState>,
    /// Last chat the operator wrote from
    operator_chat: Option<ChatId>,
    /// Where uploads and announcements are forwarded
    forward_target: Option<ChatId>,
}

impl<A, S> BotRuntime<A, S>
where
    A: BotApi + 'static,
    S: CatalogStore + 'static,
{
    /// Load the catalog from the store and persist the merged view back
    pub async fn start(config: BotConfig, api: Arc<A>, store: S) -> Result<Self, String> {
        let snapshot = store.load_snapshot().await?;
        let operator_chat = snapshot.operator_chat;
        let catalog = Catalog::load(snapshot);

        let mut runtime = Self {
            forward_target: config.forward_chat.or(operator_chat),
            config,
            api,
            store,
            catalog,
            conversations: HashMap::new(),
            operator_chat,
        };

        runtime.persist_accounts().await;
        runtime.persist_apps().await;
        if operator_chat.is_some() {
            runtime.register_active_host().await;
        }

        tracing::info!(
            apps = runtime.catalog.apps().len(),
            accounts = runtime.catalog.accounts().len(),
            operator_chat = ?runtime.operator_chat,
            forward_target = ?runtime.forward_target,
            "Bot runtime started"
        );
        Ok(runtime)
    }

    #[allow(dead_code)] // Useful for tests
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[allow(dead_code)] // Useful for tests
    pub fn conversation(&self, chat_id: ChatId) -> ConvState {
        self.conversations.get(&chat_id).cloned().unwrap_or_default()
    }

    #[allow(dead_code)] // Useful for tests
    pub fn forward_target(&self) -> Option<ChatId> {
        self.forward_target
    }

    /// Process one update to completion
    pub async fn handle_update(&mut self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await;
        } else {
            tracing::debug!(update_id = update.update_id, "Ignoring update without message");
        }
    }

    async fn handle_message(&mut self, message: Message) {
        let chat_id = message.chat.id;
        let sender = message.sender_username().map(str::to_string);

        if self.context(chat_id).is_operator(sender.as_deref()) {
            self.note_operator_chat(chat_id).await;
        }

        let input = if let Some(text) = message.text.clone() {
            MessageInput::Text(text)
        } else if let Some(document) = &message.document {
            MessageInput::Document {
                file_id: document.file_id.clone(),
            }
        } else if let Some(file_id) = message.largest_photo() {
            MessageInput::Photo {
                file_id: file_id.to_string(),
            }
        } else {
            MessageInput::Other
        };

        let event = Event::Message {
            sender,
            input,
            message_id: message.message_id,
        };
        self.dispatch(chat_id, event).await;
    }

    async fn handle_callback(&mut self, query: CallbackQuery) {
        let chat_id = query
            .message
            .as_ref()
            .map_or(query.from.id, |m| m.chat.id);

        let event = Event::ButtonPress {
            sender: query.from.username,
            payload: query.data.unwrap_or_default(),
            query_id: query.id,
        };
        self.dispatch(chat_id, event).await;
    }

    fn context(&self, chat_id: ChatId) -> ConvContext {
        ConvContext::new(chat_id, self.config.operator.as_str(), SYSTEM_AUTHOR)
    }

    async fn dispatch(&mut self, chat_id: ChatId, event: Event) {
        let state = self.conversation(chat_id);
        let context = self.context(chat_id);
        let result = transition(&state, &context, event);

        if result.new_state != state {
            tracing::debug!(
                chat_id = context.chat_id,
                from = state.step_name(),
                to = result.new_state.step_name(),
                "Conversation step changed"
            );
        }
        if result.new_state.is_idle() {
            self.conversations.remove(&chat_id);
        } else {
            self.conversations.insert(chat_id, result.new_state);
        }

        for effect in result.effects {
            self.execute_effect(chat_id, effect).await;
        }
    }

    /// Remember where the operator talks from
    async fn note_operator_chat(&mut self, chat_id: ChatId) {
        if self.operator_chat != Some(chat_id) {
            self.operator_chat = Some(chat_id);
            if let Err(e) = self.store.save_operator_chat(chat_id).await {
                tracing::error!(error = %e, "Failed to persist operator chat");
            }
            tracing::info!(chat_id, "Operator chat registered");
        }
        if self.forward_target.is_none() {
            self.forward_target = Some(chat_id);
        }
        self.register_active_host().await;
    }

    /// The signed-in account becomes a host once the operator chat is known
    async fn register_active_host(&mut self) {
        if self.catalog.is_guest() {
            return;
        }
        let active = self.catalog.active_user().to_string();
        if self.catalog.add_host(&active) {
            tracing::info!(nickname = %active, "Host user registered");
            if let Err(e) = self.store.save_hosts(self.catalog.hosts()).await {
                tracing::error!(error = %e, "Failed to persist host users");
            }
        }
    }

    async fn execute_effect(&mut self, chat_id: ChatId, effect: Effect) {
        match effect {
            Effect::Reply(message) => self.send(chat_id, &message).await,

            Effect::ForwardToGroup { message_id } => self.forward(chat_id, message_id).await,

            Effect::SendUserDetails => self.send_user_details(chat_id).await,

            Effect::SendUserList => {
                let text = self.user_list_text();
                self.send(chat_id, &OutgoingMessage::html(text)).await;
            }

            Effect::SendHostUsers => {
                let message = if self.catalog.hosts().is_empty() {
                    OutgoingMessage::plain("No host user accounts found.")
                } else {
                    OutgoingMessage::html(format!(
                        "<b>Granxy App Store Host Users:</b>\n{}",
                        numbered(self.catalog.hosts().iter().map(String::as_str))
                    ))
                };
                self.send(chat_id, &message).await;
            }

            Effect::SendPublishedApps => self.send_published_apps(chat_id).await,

            Effect::SendSyncableApps => self.send_syncable_apps(chat_id).await,

            Effect::StopSync => {
                self.catalog.stop_sync();
                self.log_storefront();
            }

            Effect::CommitApp { record } => self.commit_app(record).await,

            Effect::DeleteUser { nickname } => self.delete_user(chat_id, &nickname).await,

            Effect::DeleteApp { name } => {
                let text = if self.catalog.delete_app(&name) {
                    self.persist_apps().await;
                    self.log_storefront();
                    format!("{name} has been removed from the Granxy app store successfully.")
                } else {
                    format!("Failed to delete app '{name}'. App not found or already deleted.")
                };
                self.send(chat_id, &OutgoingMessage::plain(text)).await;
            }

            Effect::SyncApp { name } => {
                let text = if self.catalog.start_sync(&name) {
                    self.log_storefront();
                    format!(
                        "Sync started for \"{name}\". It will now be displayed in \"Newly Uploaded\" for users entering the store."
                    )
                } else {
                    format!("Failed to start sync for \"{name}\". App not found.")
                };
                self.send(chat_id, &OutgoingMessage::plain(text)).await;
            }

            Effect::AnswerCallback { query_id } => {
                if let Err(e) = self.api.answer_callback(&query_id).await {
                    tracing::warn!(error = %e, "Failed to answer callback query");
                }
            }
        }
    }

    async fn send(&self, chat_id: ChatId, message: &OutgoingMessage) {
        if let Err(e) = self.api.send_message(chat_id, message).await {
            tracing::warn!(chat_id, error = %e, "Failed to send message");
        }
    }

    /// Send messages in order with a pause between consecutive ones
    async fn send_paced(&self, chat_id: ChatId, messages: Vec<OutgoingMessage>, delay: Duration) {
        for (i, message) in messages.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.send(chat_id, message).await;
        }
    }

    async fn forward(&self, from_chat: ChatId, message_id: MessageId) {
        let Some(target) = self.forward_target else {
            tracing::warn!(message_id, "No forwarding target, upload not forwarded");
            return;
        };
        if let Err(e) = self
            .api
            .forward_message(target, from_chat, message_id)
            .await
        {
            tracing::warn!(target, message_id, error = %e, "Failed to forward upload");
        }
    }

    async fn send_user_details(&self, chat_id: ChatId) {
        let users = self.catalog.visible_users();
        if users.is_empty() {
            self.send(chat_id, &OutgoingMessage::plain("No user details found in the app."))
                .await;
            return;
        }

        let messages = users
            .iter()
            .map(|user| {
                let apps = self.catalog.authored_by(&user.nickname);
                let apps = if apps.is_empty() {
                    "None".to_string()
                } else {
                    escape_html(&apps.join(", "))
                };
                let message = OutgoingMessage::html(format!(
                    "<b>USER DETAILS:</b>\nUsername: {}\nGmail: {}\nPassword: {}\nPublished Apps: {apps}",
                    escape_html(&user.nickname),
                    escape_html(&user.email),
                    escape_html(&user.password),
                ));
                with_button(message, "Delete User", ButtonAction::DeleteUser(user.nickname.clone()))
            })
            .collect();
        self.send_paced(chat_id, messages, self.config.pacing.user_details)
            .await;
    }

    fn user_list_text(&self) -> String {
        let users = self.catalog.visible_users();
        let mut text = String::from("<b>All User Accounts:</b>\n");
        if users.is_empty() {
            text.push_str("No non-staff user accounts found in the app.\n");
        } else {
            text.push_str(&numbered(users.iter().map(|u| u.nickname.as_str())));
        }

        text.push_str("\n<b>Host User Accounts (Bot Activated On Their Devices):</b>\n");
        if self.catalog.hosts().is_empty() {
            text.push_str("No host user accounts found.\n");
        } else {
            text.push_str(&numbered(self.catalog.hosts().iter().map(String::as_str)));
        }
        text
    }

    async fn send_published_apps(&self, chat_id: ChatId) {
        let messages: Vec<OutgoingMessage> = self
            .catalog
            .publishable()
            .map(|app| {
                with_button(
                    OutgoingMessage::html(format!("<b>{}</b>", escape_html(&app.name))),
                    "Delete",
                    ButtonAction::DeleteApp(app.name.clone()),
                )
            })
            .collect();

        if messages.is_empty() {
            self.send(chat_id, &OutgoingMessage::plain("No apps have been published yet."))
                .await;
        } else {
            self.send_paced(chat_id, messages, self.config.pacing.published_apps)
                .await;
        }
    }

    async fn send_syncable_apps(&self, chat_id: ChatId) {
        let apps: Vec<OutgoingMessage> = self
            .catalog
            .publishable()
            .map(|app| {
                with_button(
                    OutgoingMessage::html(format!("<b>{}</b>", escape_html(&app.name))),
                    "Sync",
                    ButtonAction::SyncApp(app.name.clone()),
                )
            })
            .collect();

        if apps.is_empty() {
            self.send(chat_id, &OutgoingMessage::plain("No apps available to sync."))
                .await;
            return;
        }

        let mut messages = Vec::with_capacity(apps.len() + 2);
        messages.push(OutgoingMessage::plain("Select an app to sync:"));
        messages.extend(apps);
        messages.push(OutgoingMessage::plain("To stop syncing, type \"Stop\"."));
        self.send_paced(chat_id, messages, self.config.pacing.sync_list)
            .await;
    }

    async fn commit_app(&mut self, mut record: AppRecord) {
        record.published_at = Some(Utc::now());
        let announcement = format!(
            "🎉 New App Published! 🎉\n\n<b>Name:</b> {}\n<b>Author:</b> {}\n\nCheck it out in the Granxy App Store!",
            escape_html(&record.name),
            escape_html(&record.author),
        );
        tracing::info!(
            name = %record.name,
            author = %record.author,
            repeatedly_published = record.repeatedly_published,
            "App published"
        );

        self.catalog.commit(record);
        self.persist_apps().await;
        self.log_storefront();

        match self.forward_target {
            Some(target) => self.send(target, &OutgoingMessage::html(announcement)).await,
            None => tracing::warn!("No forwarding target, publication not announced"),
        }
    }

    async fn delete_user(&mut self, chat_id: ChatId, nickname: &str) {
        let removal = self.catalog.delete_and_ban_user(nickname);

        if removal.found {
            self.persist_accounts().await;
        }
        if removal.newly_banned {
            if let Err(e) = self.store.save_banned(self.catalog.banned()).await {
                tracing::error!(error = %e, "Failed to persist banned users");
            }
        }
        if removal.demoted_active {
            if let Err(e) = self.store.save_active_user(None).await {
                tracing::error!(error = %e, "Failed to clear active user");
            }
        }
        tracing::info!(nickname, found = removal.found, "User removed and banned");

        let text = if removal.found {
            format!("User {nickname} has been removed from the Granxy app store.")
        } else {
            format!("Failed to delete user '{nickname}'. User not found or already deleted.")
        };
        self.send(chat_id, &OutgoingMessage::plain(text)).await;
    }

    async fn persist_apps(&self) {
        if let Err(e) = self.store.save_apps(self.catalog.apps()).await {
            tracing::error!(error = %e, "Failed to persist apps");
        }
    }

    async fn persist_accounts(&self) {
        if let Err(e) = self.store.save_accounts(self.catalog.accounts()).await {
            tracing::error!(error = %e, "Failed to persist accounts");
        }
    }

    fn log_storefront(&self) {
        tracing::info!(
            featured = ?self.catalog.featured().map(|app| app.name.as_str()),
            published = self.catalog.publishable().count(),
            "Storefront refreshed"
        );
    }
}

/// Attach a single inline button, or send the message bare when the
/// payload would exceed the callback data limit
fn with_button(message: OutgoingMessage, label: &str, action: ButtonAction) -> OutgoingMessage {
    if action.fits_button() {
        message.with_markup(ReplyMarkup::single_button(label, action.payload()))
    } else {
        tracing::warn!(
            label,
            payload_len = action.payload().len(),
            "Callback data too long, sending without button"
        );
        message
    }
}

/// "1. a\n2. b\n"
fn numbered<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .enumerate()
        .map(|(i, name)| format!("{}. {}\n", i + 1, escape_html(name)))
        .collect()
}
