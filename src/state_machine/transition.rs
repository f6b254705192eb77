//! Pure state transition function

use super::{AppDraft, ButtonAction, Command, ConvState, Effect, Event, ListingDraft, MessageInput};
use crate::telegram::{ChatId, MessageId, ReplyMarkup};

/// Reply to anyone other than the operator
pub const UNAUTHORIZED_MESSAGE: &str = "This organization is not for staff or non staff individual";
pub const UNAUTHORIZED_BUTTON: &str = "You are not authorized to perform this action.";

/// Phrases an outsider can send without being told off
const SILENT_PHRASES: [&str; 4] = ["/start", "User Details", "Publish", "Sync Apps"];

pub const MENU_ROWS: [&[&str]; 3] = [
    &["User Details", "Publish"],
    &["Published apps", "Sync Apps"],
    &["List Users", "Send all Host users"],
];

/// Per-chat facts the transition needs
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub chat_id: ChatId,
    /// Username allowed to operate the bot
    pub operator: String,
    /// Author recorded on repeatedly published listings
    pub system_author: String,
}

impl ConvContext {
    pub fn new(
        chat_id: ChatId,
        operator: impl Into<String>,
        system_author: impl Into<String>,
    ) -> Self {
        Self {
            chat_id,
            operator: operator.into(),
            system_author: system_author.into(),
        }
    }

    pub fn is_operator(&self, sender: Option<&str>) -> bool {
        sender.is_some_and(|s| s.eq_ignore_ascii_case(&self.operator))
    }
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Keep the current state and send a corrective prompt
    fn reprompt(state: &ConvState, text: impl Into<String>) -> Self {
        Self::new(state.clone()).with_effect(Effect::reply(text))
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; every side
/// effect is described by the returned effects.
pub fn transition(state: &ConvState, context: &ConvContext, event: Event) -> TransitionResult {
    match event {
        Event::ButtonPress {
            sender,
            payload,
            query_id,
        } => {
            let ack = Effect::AnswerCallback { query_id };
            if !context.is_operator(sender.as_deref()) {
                return TransitionResult::new(state.clone())
                    .with_effect(Effect::reply(UNAUTHORIZED_BUTTON))
                    .with_effect(ack);
            }
            let action = match ButtonAction::parse(&payload) {
                ButtonAction::DeleteUser(nickname) => Some(Effect::DeleteUser { nickname }),
                ButtonAction::DeleteApp(name) => Some(Effect::DeleteApp { name }),
                ButtonAction::SyncApp(name) => Some(Effect::SyncApp { name }),
                ButtonAction::Unknown => None,
            };
            TransitionResult::new(state.clone())
                .with_effects(action)
                .with_effect(ack)
        }

        Event::Message {
            sender,
            input,
            message_id,
        } => {
            if !context.is_operator(sender.as_deref()) {
                return outsider_message(state, &input);
            }
            let author = sender.unwrap_or_default();
            match input {
                MessageInput::Text(text) => match Command::parse(&text) {
                    Some(command) => run_command(command),
                    None => handle_text(state, context, &author, text.trim()),
                },
                MessageInput::Document { file_id } => handle_document(state, file_id, message_id),
                MessageInput::Photo { file_id } => handle_photo(state, file_id, message_id),
                MessageInput::Other => unexpected_upload(state),
            }
        }
    }
}

/// Outsiders are rejected only when idle and not sending a menu phrase;
/// anything else from them is dropped without a reply.
fn outsider_message(state: &ConvState, input: &MessageInput) -> TransitionResult {
    let reject = match input {
        MessageInput::Text(text) => state.is_idle() && !SILENT_PHRASES.contains(&text.trim()),
        _ => true,
    };
    let result = TransitionResult::new(state.clone());
    if reject {
        result.with_effect(Effect::reply(UNAUTHORIZED_MESSAGE))
    } else {
        result
    }
}

fn run_command(command: Command) -> TransitionResult {
    let idle = TransitionResult::new(ConvState::Idle);
    match command {
        Command::Start => idle.with_effect(Effect::reply("Hi")).with_effect(
            Effect::reply_with_markup("What would you like to do?", ReplyMarkup::keyboard(&MENU_ROWS)),
        ),
        Command::UserDetails => idle.with_effect(Effect::SendUserDetails),
        Command::ListUsers => idle.with_effect(Effect::SendUserList),
        Command::HostUsers => idle.with_effect(Effect::SendHostUsers),
        Command::Publish => {
            TransitionResult::new(ConvState::ExpectingAppName).with_effect(Effect::reply("App name"))
        }
        Command::PublishedApps => idle.with_effect(Effect::SendPublishedApps),
        Command::SyncApps => idle.with_effect(Effect::SendSyncableApps),
        Command::Stop => idle
            .with_effect(Effect::StopSync)
            .with_effect(Effect::reply("Sync paused.")),
    }
}

fn handle_text(state: &ConvState, context: &ConvContext, author: &str, text: &str) -> TransitionResult {
    match state {
        ConvState::ExpectingAppName if text.is_empty() => TransitionResult::reprompt(state, "App name"),
        ConvState::ExpectingAppName if !app_buttons_fit(text) => {
            TransitionResult::reprompt(state, "App name is too long. Please send a shorter name.")
        }
        ConvState::ExpectingAppName => TransitionResult::new(ConvState::ExpectingAppFile {
            name: text.to_string(),
        })
        .with_effect(Effect::reply("Upload your app")),

        ConvState::ExpectingAppDescription {
            name,
            file_id,
            icon_id,
        } => TransitionResult::new(ConvState::ExpectingAppScreenshot {
            listing: ListingDraft {
                name: name.clone(),
                file_id: file_id.clone(),
                icon_id: icon_id.clone(),
                description: text.to_string(),
                screenshot_ids: vec![],
            },
        })
        .with_effect(Effect::reply("App Screenshot")),

        ConvState::ExpectingAppScreenshot { listing } if text.eq_ignore_ascii_case("done") => {
            TransitionResult::new(ConvState::ExpectingAppDownloadUrl {
                listing: listing.clone(),
            })
            .with_effect(Effect::reply("App download Url"))
        }
        ConvState::ExpectingAppScreenshot { .. } => TransitionResult::reprompt(
            state,
            "Please upload a screenshot or type \"Done\" to finish.",
        ),

        ConvState::ExpectingAppDownloadUrl { listing } => {
            if text.starts_with("http://") || text.starts_with("https://") {
                TransitionResult::new(ConvState::ExpectingAppSize {
                    listing: listing.clone(),
                    download_url: text.to_string(),
                })
                .with_effect(Effect::reply("App size (in MB)"))
            } else {
                TransitionResult::reprompt(state, "App download Url can only start with https or http")
            }
        }

        ConvState::ExpectingAppSize {
            listing,
            download_url,
        } => match parse_size(text) {
            Some(size_mb) => TransitionResult::new(ConvState::AwaitingYesConfirmation {
                draft: AppDraft {
                    listing: listing.clone(),
                    download_url: download_url.clone(),
                    size_mb,
                },
            })
            .with_effect(Effect::reply(format!(
                "Your app size is: {size_mb}MB. Type \"Yes\" to confirm publication or \"No\" to cancel."
            ))),
            None => TransitionResult::reprompt(
                state,
                "App size should be written in only numeric numbers not including alphabet",
            ),
        },

        ConvState::AwaitingYesConfirmation { draft } => {
            if text.eq_ignore_ascii_case("yes") {
                TransitionResult::new(ConvState::AwaitingRepeatedPublishConfirmation {
                    draft: draft.clone(),
                })
                .with_effect(Effect::reply(
                    "Should this app be repeatedly published? Type \"Yes\" or \"No\".",
                ))
            } else if text.eq_ignore_ascii_case("no") {
                TransitionResult::new(ConvState::Idle).with_effect(Effect::reply("App publishing cancelled."))
            } else {
                TransitionResult::reprompt(state, "Please type \"Yes\" to confirm or \"No\" to cancel.")
            }
        }

        ConvState::AwaitingRepeatedPublishConfirmation { draft } => {
            let repeated = text.eq_ignore_ascii_case("yes");
            let author = if repeated {
                context.system_author.as_str()
            } else {
                author
            };
            TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::CommitApp {
                    record: draft.clone().into_record(author, repeated),
                })
                .with_effect(Effect::reply("App published successfully!"))
        }

        ConvState::Idle | ConvState::ExpectingAppFile { .. } | ConvState::ExpectingAppIcon { .. } => {
            TransitionResult::reprompt(
                state,
                format!(
                    "Unexpected text input for current step \"{}\". Please follow the instructions.",
                    state.step_name()
                ),
            )
        }
    }
}

/// Every button that will carry this listing name stays within the limit
fn app_buttons_fit(name: &str) -> bool {
    ButtonAction::DeleteApp(name.to_string()).fits_button()
        && ButtonAction::SyncApp(name.to_string()).fits_button()
}

fn handle_document(state: &ConvState, file_id: String, message_id: MessageId) -> TransitionResult {
    match state {
        ConvState::ExpectingAppFile { name } => TransitionResult::new(ConvState::ExpectingAppIcon {
            name: name.clone(),
            file_id,
        })
        .with_effect(Effect::ForwardToGroup { message_id })
        .with_effect(Effect::reply("App icon")),
        _ => unexpected_upload(state),
    }
}

fn handle_photo(state: &ConvState, file_id: String, message_id: MessageId) -> TransitionResult {
    match state {
        ConvState::ExpectingAppIcon {
            name,
            file_id: app_file,
        } => TransitionResult::new(ConvState::ExpectingAppDescription {
            name: name.clone(),
            file_id: app_file.clone(),
            icon_id: file_id,
        })
        .with_effect(Effect::ForwardToGroup { message_id })
        .with_effect(Effect::reply("App description")),

        ConvState::ExpectingAppScreenshot { listing } => {
            let mut listing = listing.clone();
            listing.screenshot_ids.push(file_id);
            TransitionResult::new(ConvState::ExpectingAppScreenshot { listing })
                .with_effect(Effect::ForwardToGroup { message_id })
                .with_effect(Effect::reply(
                    "Screenshot received! Send more, or type \"Done\" to finish.",
                ))
        }

        _ => unexpected_upload(state),
    }
}

fn unexpected_upload(state: &ConvState) -> TransitionResult {
    TransitionResult::reprompt(
        state,
        format!(
            "Unexpected file/photo input for current step \"{}\". Please follow the instructions.",
            state.step_name()
        ),
    )
}

/// A finite, strictly positive number of megabytes
fn parse_size(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|size| size.is_finite() && *size > 0.0)
}
