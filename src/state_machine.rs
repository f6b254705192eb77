//! Publish conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the transition function decides, the runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{ButtonAction, Command, Event, MessageInput};
pub use state::{AppDraft, ConvState, ListingDraft};
pub use transition::{transition, ConvContext};
