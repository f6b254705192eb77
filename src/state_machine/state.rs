//! Conversation state types

use crate::db::AppRecord;
use serde::{Deserialize, Serialize};

/// Listing fields collected once the description is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub name: String,
    pub file_id: String,
    pub icon_id: String,
    pub description: String,
    pub screenshot_ids: Vec<String>,
}

/// A fully collected listing awaiting confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDraft {
    pub listing: ListingDraft,
    pub download_url: String,
    pub size_mb: f64,
}

const NO_DESCRIPTION: &str = "No description provided.";

impl AppDraft {
    pub fn into_record(self, author: impl Into<String>, repeatedly_published: bool) -> AppRecord {
        let ListingDraft {
            name,
            file_id,
            icon_id,
            description,
            screenshot_ids,
        } = self.listing;

        AppRecord {
            name,
            author: author.into(),
            description: if description.is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                description
            },
            file_id: Some(file_id),
            icon_id: Some(icon_id),
            screenshot_ids,
            download_url: Some(self.download_url),
            size_mb: Some(self.size_mb),
            repeatedly_published,
            published_at: None,
        }
    }
}

/// Step of one chat's publish flow.
///
/// Each variant carries exactly the draft fields collected so far.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// No flow in progress
    #[default]
    Idle,

    ExpectingAppName,

    ExpectingAppFile {
        name: String,
    },

    ExpectingAppIcon {
        name: String,
        file_id: String,
    },

    ExpectingAppDescription {
        name: String,
        file_id: String,
        icon_id: String,
    },

    /// Accepts any number of screenshots until "Done"
    ExpectingAppScreenshot {
        listing: ListingDraft,
    },

    ExpectingAppDownloadUrl {
        listing: ListingDraft,
    },

    ExpectingAppSize {
        listing: ListingDraft,
        download_url: String,
    },

    AwaitingYesConfirmation {
        draft: AppDraft,
    },

    AwaitingRepeatedPublishConfirmation {
        draft: AppDraft,
    },
}

impl ConvState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConvState::Idle)
    }

    /// Step name as shown to the operator
    pub fn step_name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::ExpectingAppName => "expectingAppName",
            ConvState::ExpectingAppFile { .. } => "expectingAppFile",
            ConvState::ExpectingAppIcon { .. } => "expectingAppIcon",
            ConvState::ExpectingAppDescription { .. } => "expectingAppDescription",
            ConvState::ExpectingAppScreenshot { .. } => "expectingAppScreenshot",
            ConvState::ExpectingAppDownloadUrl { .. } => "expectingAppDownloadUrl",
            ConvState::ExpectingAppSize { .. } => "expectingAppSize",
            ConvState::AwaitingYesConfirmation { .. } => "awaitingYesConfirmation",
            ConvState::AwaitingRepeatedPublishConfirmation { .. } => {
                "awaitingRepeatedPublishConfirmation"
            }
        }
    }
}
