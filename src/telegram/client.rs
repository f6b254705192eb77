//! HTTP client for the Bot API

use super::types::{
    AnswerCallbackQueryRequest, ApiResponse, ChatId, ForwardMessageRequest, GetUpdatesRequest,
    Message, MessageId, OutgoingMessage, SendMessageRequest, Update,
};
use super::ApiError;
use crate::config::BotConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Slack on top of the long-poll wait before the transport gives up
const TRANSPORT_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.poll_timeout + TRANSPORT_GRACE)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_base, config.token),
            poll_timeout: config.poll_timeout,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        let bytes = response.bytes().await?;
        let envelope: Option<ApiResponse<T>> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let description = envelope.as_ref().and_then(|e| e.description.as_deref());
            return Err(ApiError::http(status.as_u16(), description));
        }

        let envelope = envelope
            .ok_or_else(|| ApiError::decode(format!("Unexpected response body from {method}")))?;
        if !envelope.ok {
            return Err(ApiError::api(envelope.description.as_deref()));
        }
        envelope
            .result
            .ok_or_else(|| ApiError::decode(format!("Missing result in {method} response")))
    }

    /// Long-poll for updates starting at `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ApiError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message", "callback_query"],
        };
        self.call("getUpdates", &request).await
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        message: &OutgoingMessage,
    ) -> Result<Message, ApiError> {
        let request = SendMessageRequest {
            chat_id,
            text: &message.text,
            parse_mode: message.parse_mode,
            reply_markup: message.reply_markup.as_ref(),
        };
        self.call("sendMessage", &request).await
    }

    /// Re-deliver an already received message without re-uploading it
    pub async fn forward_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<Message, ApiError> {
        let request = ForwardMessageRequest {
            chat_id,
            from_chat_id,
            message_id,
        };
        self.call("forwardMessage", &request).await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<bool, ApiError> {
        self.call(
            "answerCallbackQuery",
            &AnswerCallbackQueryRequest { callback_query_id },
        )
        .await
    }
}
