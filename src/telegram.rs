//! Telegram Bot API client
//!
//! Only the handful of methods the store bot needs: long-poll updates,
//! send, forward and callback acknowledgement.

mod client;
mod error;
mod types;

pub use client::TelegramClient;
pub use error::ApiError;
pub use types::*;
