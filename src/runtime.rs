//! Runtime that drives conversations from Bot API updates
//!
//! A single `BotRuntime` owns the catalog and every chat's conversation
//! state; the `Poller` feeds it one update at a time.

mod executor;
mod poller;
pub mod traits;


pub use executor::BotRuntime;
pub use poller::Poller;
pub use traits::*;

use crate::telegram::TelegramClient;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = BotRuntime<TelegramClient, DatabaseStorage>;

pub type ProductionPoller = Poller<TelegramClient, DatabaseStorage>;
