//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::telegram::OutgoingMessage;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const OPERATOR: &str = "Pbeta2025";

fn test_context() -> ConvContext {
    ConvContext::new(1, OPERATOR, "Granxy")
}

fn operator_text(text: &str) -> Event {
    Event::Message {
        sender: Some(OPERATOR.to_string()),
        input: MessageInput::Text(text.to_string()),
        message_id: 1,
    }
}

fn operator_upload(input: MessageInput, message_id: i64) -> Event {
    Event::Message {
        sender: Some(OPERATOR.to_string()),
        input,
        message_id,
    }
}

fn has_commit(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::CommitApp { .. }))
}

/// Feed events in order, returning the final state and every effect
fn run(events: Vec<Event>) -> (ConvState, Vec<Effect>) {
    let ctx = test_context();
    let mut state = ConvState::Idle;
    let mut effects = vec![];
    for event in events {
        let result = transition(&state, &ctx, event);
        state = result.new_state;
        effects.extend(result.effects);
    }
    (state, effects)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_listing() -> impl Strategy<Value = ListingDraft> {
    (
        "App[A-Za-z]{1,12}",
        "[a-z0-9]{8}",
        "[a-z0-9]{8}",
        "About[A-Za-z ]{0,25}",
        proptest::collection::vec("[a-z0-9]{8}", 0..4),
    )
        .prop_map(|(name, file_id, icon_id, description, screenshot_ids)| ListingDraft {
            name,
            file_id,
            icon_id,
            description,
            screenshot_ids,
        })
}

fn arb_draft() -> impl Strategy<Value = AppDraft> {
    (arb_listing(), "https?://[a-z]{3,10}\\.com/[a-z]{1,8}", 1u32..5000).prop_map(
        |(listing, download_url, tenths)| AppDraft {
            listing,
            download_url,
            size_mb: f64::from(tenths) / 10.0,
        },
    )
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        Just(ConvState::ExpectingAppName),
        "[A-Za-z]{1,10}".prop_map(|name| ConvState::ExpectingAppFile { name }),
        ("[A-Za-z]{1,10}", "[a-z0-9]{8}")
            .prop_map(|(name, file_id)| ConvState::ExpectingAppIcon { name, file_id }),
        ("[A-Za-z]{1,10}", "[a-z0-9]{8}", "[a-z0-9]{8}").prop_map(|(name, file_id, icon_id)| {
            ConvState::ExpectingAppDescription {
                name,
                file_id,
                icon_id,
            }
        }),
        arb_listing().prop_map(|listing| ConvState::ExpectingAppScreenshot { listing }),
        arb_listing().prop_map(|listing| ConvState::ExpectingAppDownloadUrl { listing }),
        arb_draft().prop_map(|d| ConvState::ExpectingAppSize {
            listing: d.listing,
            download_url: d.download_url,
        }),
        arb_draft().prop_map(|draft| ConvState::AwaitingYesConfirmation { draft }),
        arb_draft().prop_map(|draft| ConvState::AwaitingRepeatedPublishConfirmation { draft }),
    ]
}

fn arb_input() -> impl Strategy<Value = MessageInput> {
    prop_oneof![
        "[A-Za-z /]{0,20}".prop_map(MessageInput::Text),
        "[a-z0-9]{8}".prop_map(|file_id| MessageInput::Document { file_id }),
        "[a-z0-9]{8}".prop_map(|file_id| MessageInput::Photo { file_id }),
        Just(MessageInput::Other),
    ]
}

fn arb_command_text() -> impl Strategy<Value = (&'static str, Command)> {
    prop_oneof![
        Just(("/start", Command::Start)),
        Just(("User Details", Command::UserDetails)),
        Just(("List Users", Command::ListUsers)),
        Just(("Send all Host users", Command::HostUsers)),
        Just(("Publish", Command::Publish)),
        Just(("Published apps", Command::PublishedApps)),
        Just(("Sync Apps", Command::SyncApps)),
        Just(("Stop", Command::Stop)),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // A complete flow commits exactly the collected fields
    #[test]
    fn prop_full_flow_commits_inputs(draft in arb_draft(), repeated in any::<bool>()) {
        let listing = draft.listing.clone();
        let mut events = vec![
            operator_text("Publish"),
            operator_text(&listing.name),
            operator_upload(MessageInput::Document { file_id: listing.file_id.clone() }, 2),
            operator_upload(MessageInput::Photo { file_id: listing.icon_id.clone() }, 3),
            operator_text(&listing.description),
        ];
        for (i, id) in listing.screenshot_ids.iter().enumerate() {
            events.push(operator_upload(MessageInput::Photo { file_id: id.clone() }, 10 + i as i64));
        }
        events.push(operator_text("Done"));
        events.push(operator_text(&draft.download_url));
        events.push(operator_text(&draft.size_mb.to_string()));
        events.push(operator_text("Yes"));
        events.push(operator_text(if repeated { "Yes" } else { "No" }));

        let (state, effects) = run(events);
        prop_assert_eq!(state, ConvState::Idle);

        let commits: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::CommitApp { record } => Some(record),
                _ => None,
            })
            .collect();
        prop_assert_eq!(commits.len(), 1);

        let author = if repeated { "Granxy" } else { OPERATOR };
        let expected = AppDraft {
            listing: ListingDraft {
                description: listing.description.trim().to_string(),
                ..listing.clone()
            },
            ..draft
        }
        .into_record(author, repeated);
        prop_assert_eq!(commits[0], &expected);

        let forwards = effects
            .iter()
            .filter(|e| matches!(e, Effect::ForwardToGroup { .. }))
            .count();
        prop_assert_eq!(forwards, 2 + listing.screenshot_ids.len());
    }

    // Declining confirmation never publishes
    #[test]
    fn prop_no_cancels(draft in arb_draft()) {
        let state = ConvState::AwaitingYesConfirmation { draft };
        let result = transition(&state, &test_context(), operator_text("no"));
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert!(!has_commit(&result.effects));
    }

    // Bad URLs keep the step
    #[test]
    fn prop_invalid_url_keeps_state(listing in arb_listing(), url in "[a-z]{1,5}://[a-z]{1,10}") {
        prop_assume!(!url.starts_with("http://") && !url.starts_with("https://"));
        let state = ConvState::ExpectingAppDownloadUrl { listing };
        let result = transition(&state, &test_context(), operator_text(&url));
        prop_assert_eq!(result.new_state, state);
    }

    // Non-numeric sizes keep the step
    #[test]
    fn prop_invalid_size_keeps_state(draft in arb_draft(), size in "[0-9]{0,3}[a-zA-Z]{1,4}") {
        let state = ConvState::ExpectingAppSize {
            listing: draft.listing,
            download_url: draft.download_url,
        };
        prop_assume!(Command::parse(&size).is_none());
        let result = transition(&state, &test_context(), operator_text(&size));
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects.len(), 1);
    }

    // Outsiders never move a conversation
    #[test]
    fn prop_outsider_never_changes_state(
        state in arb_state(),
        sender in proptest::option::of("[a-z]{3,10}"),
        input in arb_input(),
    ) {
        prop_assume!(sender.as_deref().map_or(true, |s| !s.eq_ignore_ascii_case(OPERATOR)));
        let event = Event::Message { sender, input, message_id: 1 };
        let result = transition(&state, &test_context(), event);
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.len() <= 1);
        for effect in &result.effects {
            prop_assert!(
                matches!(effect, Effect::Reply(OutgoingMessage { text, .. }) if text == UNAUTHORIZED_MESSAGE),
                "unexpected effect {:?}",
                effect
            );
        }
    }

    // Commands win at every step
    #[test]
    fn prop_commands_reset_flow(state in arb_state(), (text, command) in arb_command_text()) {
        let result = transition(&state, &test_context(), operator_text(text));
        let expected = if command == Command::Publish {
            ConvState::ExpectingAppName
        } else {
            ConvState::Idle
        };
        prop_assert_eq!(result.new_state, expected);
        prop_assert!(!has_commit(&result.effects));
    }

    // Button presses never touch the conversation
    #[test]
    fn prop_buttons_keep_state(
        state in arb_state(),
        sender in proptest::option::of("[A-Za-z0-9]{3,10}"),
        payload in "[a-z_]{0,20}",
    ) {
        let event = Event::ButtonPress { sender, payload, query_id: "q".to_string() };
        let result = transition(&state, &test_context(), event);
        prop_assert_eq!(result.new_state, state);
        prop_assert!(
            matches!(result.effects.last(), Some(Effect::AnswerCallback { .. })),
            "last effect must acknowledge the press"
        );
    }
}
