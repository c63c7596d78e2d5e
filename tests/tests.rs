// ../tests/tests.rs
use storyloom::ai_response::NARRATION_FAILED;
use storyloom::session::{DEFAULT_OUTCOME, TRANSPORT_ERROR_MESSAGE};
use storyloom::*;

use tokio::sync::mpsc;

fn make_session() -> (StorySession, mpsc::UnboundedReceiver<SessionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (StorySession::new(GameState::new("tester__book"), sender), receiver)
}

fn drain(receiver: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

// Drive one full turn: player free text in, canned narrator text back.
fn play_turn(session: &mut StorySession, input: &str, raw_response: &str) {
    let request = session.submit_free_text(input).expect("turn should start");
    session.complete_turn(request.seq, Ok(raw_response.to_string()));
}

#[test]
fn test_parse_full_story_turn() {
    let raw = "[NARRATION]You enter the room.\n[CHOICE]\n🔑 :: Open the door :: pragmatic\n👁️ :: Look around :: existential\n[PROGRESS:10]";
    let response = parse_story_response(raw);

    assert_eq!(response.narration, "You enter the room.");
    assert_eq!(response.progress_delta, Some(10));
    assert_eq!(response.choices.len(), 2);
    assert_eq!(
        response.choices[0],
        Choice {
            icon: Some("🔑".to_string()),
            text: "Open the door".to_string(),
            category: ChoiceCategory::Pragmatic,
        }
    );
    assert_eq!(response.choices[1].text, "Look around");
    assert_eq!(response.choices[1].category, ChoiceCategory::Existential);
}

#[test]
fn test_parse_untagged_text_is_narration() {
    let response = parse_story_response("  The rain keeps falling.  ");
    assert_eq!(response.narration, "The rain keeps falling.");
    assert!(response.choices.is_empty());
    assert!(response.fate_challenge.is_none());
}

#[test]
fn test_parse_prose_before_first_tag_is_narration_fallback() {
    let response = parse_story_response("A door slams shut.\n[PROGRESS:5]");
    assert_eq!(response.narration, "A door slams shut.");
    assert_eq!(response.progress_delta, Some(5));
}

#[test]
fn test_parse_empty_response_degrades_to_error_narration() {
    assert_eq!(parse_story_response("").narration, NARRATION_FAILED);
    assert_eq!(
        parse_story_response("[PROGRESS:10][EFFECT:glow]").narration,
        NARRATION_FAILED
    );
}

#[test]
fn test_failed_parse_drops_stray_directives() {
    // A failed turn completes with no side effects at all: directives
    // without any narration, choices, or fate roll are discarded.
    let response = parse_story_response("[PROGRESS:10][INVENTORY_ADD:x][EFFECT:glow]");
    assert_eq!(response.narration, NARRATION_FAILED);
    assert_eq!(response.progress_delta, None);
    assert_eq!(response.inventory_add, None);
    assert_eq!(response.visual_effect, None);
}

#[test]
fn test_parse_failure_turn_applies_no_side_effects() {
    let (mut session, _events) = make_session();
    play_turn(&mut session, "Begin.", "[PROGRESS:10][EFFECT:glow]");

    assert_eq!(session.phase(), SessionPhase::Presenting);
    assert_eq!(session.state().progress, 0);
    assert!(session.state().inventory.is_empty());
    let last = session.state().message_history.last().expect("a message");
    assert_eq!(last.content, NARRATION_FAILED);
}

#[test]
fn test_parse_bare_fate_roll_is_not_an_error() {
    let response = parse_story_response("[FATE_ROLL:Will the guard notice?]");
    assert_eq!(response.narration, "");
    assert_eq!(
        response.fate_challenge.as_deref(),
        Some("Will the guard notice?")
    );
    assert!(response.choices.is_empty());
}

#[test]
fn test_fate_roll_suppresses_choices() {
    let raw = "[NARRATION]The guard turns.\n[CHOICE]\n🗡️ :: Fight :: pragmatic\n[FATE_ROLL: Will the guard notice? ]";
    let response = parse_story_response(raw);
    assert!(response.choices.is_empty());
    assert_eq!(
        response.fate_challenge.as_deref(),
        Some("Will the guard notice?")
    );
    assert_eq!(response.narration, "The guard turns.");
}

#[test]
fn test_choice_line_variants() {
    let raw = "[NARRATION]Hm.\n[CHOICE]\nJust text\n🧠 :: Reflect :: existential\n🤡 :: Dance :: absurd-ish\n💬 :: Talk\n :: :: pragmatic\n";
    let choices = parse_story_response(raw).choices;

    assert_eq!(choices.len(), 4); // the empty-text line is dropped
    assert_eq!(
        choices[0],
        Choice {
            icon: None,
            text: "Just text".to_string(),
            category: ChoiceCategory::Pragmatic,
        }
    );
    assert_eq!(
        choices[1],
        Choice {
            icon: Some("🧠".to_string()),
            text: "Reflect".to_string(),
            category: ChoiceCategory::Existential,
        }
    );
    // typo'd category silently becomes pragmatic
    assert_eq!(choices[2].category, ChoiceCategory::Pragmatic);
    // two segments: icon and text
    assert_eq!(choices[3].icon.as_deref(), Some("💬"));
    assert_eq!(choices[3].category, ChoiceCategory::Pragmatic);
}

#[test]
fn test_repeated_tags_first_match_wins() {
    // Multi-occurrence semantics are undefined on the wire; this pins the
    // documented first-match-wins assumption.
    let raw = "[NARRATION]One.[PROGRESS:10][PROGRESS:90][INVENTORY_ADD:key][INVENTORY_ADD:coin]";
    let response = parse_story_response(raw);
    assert_eq!(response.progress_delta, Some(10));
    assert_eq!(response.inventory_add.as_deref(), Some("key"));
}

#[test]
fn test_parse_directive_tags() {
    let raw = "[NARRATION]Dust everywhere.[INVENTORY_REMOVE:torch][IMPACT:The cellar went dark.][SECRET_ACHIEVEMENT:Lights Out][EFFECT:whisper][FLASHBACK]A candle, years ago.[/FLASHBACK][INTERRUPTION:Mira:Don't go down there.][/INTERRUPTION]";
    let response = parse_story_response(raw);

    assert_eq!(response.inventory_remove.as_deref(), Some("torch"));
    assert_eq!(response.impact.as_deref(), Some("The cellar went dark."));
    assert_eq!(response.secret_achievement.as_deref(), Some("Lights Out"));
    assert_eq!(response.visual_effect, Some(VisualEffect::Whisper));
    assert_eq!(response.flashback.as_deref(), Some("A candle, years ago."));
    let interruption = response.interruption.expect("interruption parsed");
    assert_eq!(interruption.character_name, "Mira");
    assert_eq!(interruption.content, "Don't go down there.");
}

#[test]
fn test_unknown_effect_is_ignored() {
    let response = parse_story_response("[NARRATION]Quiet.[EFFECT:explode]");
    assert_eq!(response.visual_effect, None);
}

#[test]
fn test_unrecognized_bracket_stays_in_prose() {
    let response = parse_story_response("[NARRATION]He said [sic] nothing.");
    assert_eq!(response.narration, "He said [sic] nothing.");
}

#[test]
fn test_parse_progress_garbage_payload() {
    let response = parse_story_response("[NARRATION]Onward.[PROGRESS:lots]");
    assert_eq!(response.progress_delta, None);
}

#[test]
fn test_chat_response_strips_interruption() {
    let raw = "Of course I remember you. [INTERRUPTION:Heathcliff:Enough of this.][/INTERRUPTION] Where were we?";
    let response = parse_chat_response(raw);
    assert_eq!(response.content, "Of course I remember you.  Where were we?");
    let interruption = response.interruption.expect("interruption extracted");
    assert_eq!(interruption.character_name, "Heathcliff");
    assert_eq!(interruption.content, "Enough of this.");

    let plain = parse_chat_response("Just talking.");
    assert_eq!(plain.content, "Just talking.");
    assert!(plain.interruption.is_none());
}

#[test]
fn test_progress_is_monotone_and_bounded() {
    let mut state = GameState::new("tester__book");
    assert_eq!(state.apply_progress(50), 50);
    // negative deltas never walk progress back
    assert_eq!(state.apply_progress(-20), 50);
    assert_eq!(state.apply_progress(80), 100);
    assert_eq!(state.apply_progress(10), 100);
}

#[test]
fn test_inventory_is_an_insertion_ordered_set() {
    let mut state = GameState::new("tester__book");
    assert!(state.add_item("rusty key"));
    assert!(state.add_item("coin"));
    assert!(!state.add_item("rusty key"));
    assert_eq!(state.inventory, vec!["rusty key", "coin"]);

    assert!(state.remove_item("coin"));
    assert!(!state.remove_item("coin"));
    assert_eq!(state.inventory, vec!["rusty key"]);
}

#[test]
fn test_discovery_ledger_distribution() {
    let mut ledger = DiscoveryLedger::default();
    assert!(ledger.category_distribution().is_empty());

    let choice = |text: &str, category| Choice {
        icon: None,
        text: text.to_string(),
        category,
    };
    ledger.record(&choice("Reflect", ChoiceCategory::Existential), "thought");
    ledger.record(&choice("Run", ChoiceCategory::Pragmatic), "escaped");
    ledger.record(&choice("Hide", ChoiceCategory::Pragmatic), "hid");
    ledger.record(&choice("Sing", ChoiceCategory::Absurdist), "confused them");

    let distribution = ledger.category_distribution();
    assert_eq!(distribution[&ChoiceCategory::Pragmatic], 0.5);
    assert_eq!(distribution[&ChoiceCategory::Existential], 0.25);
    assert_eq!(distribution[&ChoiceCategory::Absurdist], 0.25);

    let replay: Vec<_> = ledger.iter().map(|d| d.choice_text.as_str()).collect();
    assert_eq!(replay, vec!["Reflect", "Run", "Hide", "Sing"]);
}

#[test]
fn test_free_text_turns_never_create_discoveries() {
    let (mut session, _events) = make_session();
    play_turn(&mut session, "Begin the story.", "[NARRATION]It begins.");
    play_turn(&mut session, "I walk north.", "[NARRATION]You walk north.[IMPACT:Cold wind.]");
    play_turn(&mut session, "I keep going.", "[NARRATION]Still going.");

    assert!(session.state().discoveries.is_empty());
    assert_eq!(session.phase(), SessionPhase::Presenting);
}

#[test]
fn test_choice_turns_create_one_discovery_each() {
    let (mut session, _events) = make_session();
    play_turn(
        &mut session,
        "Begin the story.",
        "[NARRATION]A door.\n[CHOICE]\n🔑 :: Open the door :: pragmatic\n👁️ :: Look around :: existential",
    );
    assert_eq!(session.current_choices().len(), 2);

    let request = session.select_choice(0).expect("choice should submit");
    session.complete_turn(
        request.seq,
        Ok("[NARRATION]It creaks open.[IMPACT:The hallway lies beyond.]\n[CHOICE]\n➡️ :: Step through :: pragmatic".to_string()),
    );
    let request = session.select_choice(0).expect("choice should submit");
    session.complete_turn(request.seq, Ok("[NARRATION]You step through.".to_string()));

    let discoveries: Vec<_> = session.state().discoveries.iter().cloned().collect();
    assert_eq!(discoveries.len(), 2);
    assert_eq!(discoveries[0].choice_text, "Open the door");
    assert_eq!(discoveries[0].outcome, "The hallway lies beyond.");
    // no [IMPACT] tag on the second response: placeholder outcome
    assert_eq!(discoveries[1].outcome, DEFAULT_OUTCOME);
}

#[test]
fn test_session_side_effects_and_events() {
    let (mut session, mut events) = make_session();
    play_turn(
        &mut session,
        "Begin.",
        "[NARRATION]You find a lamp.[PROGRESS:10][INVENTORY_ADD:lamp][SECRET_ACHIEVEMENT:Lamplighter]",
    );
    assert_eq!(session.state().progress, 10);
    assert_eq!(session.state().inventory, vec!["lamp"]);
    assert_eq!(session.state().achievements, vec!["Lamplighter"]);

    // same item and achievement again: both no-ops, no duplicate events
    play_turn(
        &mut session,
        "Look again.",
        "[NARRATION]Still there.[INVENTORY_ADD:lamp][SECRET_ACHIEVEMENT:Lamplighter]",
    );
    assert_eq!(session.state().inventory, vec!["lamp"]);
    assert_eq!(session.state().achievements, vec!["Lamplighter"]);

    let events = drain(&mut events);
    let inventory_events = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::InventoryChanged { .. }))
        .count();
    let achievement_events = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::AchievementUnlocked(_)))
        .count();
    assert_eq!(inventory_events, 1);
    assert_eq!(achievement_events, 1);
}

#[test]
fn test_fate_roll_turn_suspends_choices_and_hides_narration() {
    let (mut session, mut events) = make_session();
    play_turn(&mut session, "Begin.", "[NARRATION]The vault door.");
    let visible_before = session.state().message_history.len();

    play_turn(&mut session, "I pick the lock.", "[FATE_ROLL:Does the pick hold?]");
    assert_eq!(session.phase(), SessionPhase::FateRollPending);
    assert_eq!(session.pending_fate(), Some("Does the pick hold?"));
    assert!(session.current_choices().is_empty());
    // the fate record itself never reaches the visible list; only the
    // player's own action was appended
    assert_eq!(session.state().message_history.len(), visible_before + 1);

    // normal input is locked until the roll resolves
    assert!(session.submit_free_text("I run away.").is_err());

    let (outcome, request) = session
        .resolve_fate_as(FateOutcome::Success)
        .expect("fate should resolve");
    assert_eq!(outcome, FateOutcome::Success);
    assert_eq!(session.phase(), SessionPhase::AwaitingTurn);
    // the resolution string re-enters the conversation as player input
    assert_eq!(
        request.messages.last().map(|m| m.content.as_str()),
        Some(FateOutcome::Success.resolution_message())
    );
    // and a fate turn leaves no discovery behind
    assert!(session.state().discoveries.is_empty());

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(e, SessionEvent::FateRollPending(c) if c == "Does the pick hold?")));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::FateOutcomeRevealed(FateOutcome::Success)))
    );
}

#[test]
fn test_choice_answered_by_fate_roll_leaves_no_discovery() {
    let (mut session, _events) = make_session();
    play_turn(
        &mut session,
        "Begin.",
        "[NARRATION]A ledge.\n[CHOICE]\n🧗 :: Climb down :: pragmatic",
    );
    let request = session.select_choice(0).expect("choice");
    session.complete_turn(request.seq, Ok("[FATE_ROLL:Does the rope hold?]".to_string()));

    assert_eq!(session.phase(), SessionPhase::FateRollPending);
    assert!(session.state().discoveries.is_empty());
}

#[test]
fn test_fate_resolution_outside_pending_phase_is_rejected() {
    let (mut session, _events) = make_session();
    play_turn(&mut session, "Begin.", "[NARRATION]Calm seas.");
    assert!(session.resolve_fate_as(FateOutcome::Failure).is_err());
}

#[test]
fn test_roll_fate_is_a_fair_coin_shape() {
    // Not a statistical test: just pin that both outcomes are reachable.
    let outcomes: Vec<FateOutcome> = (0..256).map(|_| roll_fate()).collect();
    assert!(outcomes.contains(&FateOutcome::Success));
    assert!(outcomes.contains(&FateOutcome::Failure));
}

#[test]
fn test_second_action_rejected_while_turn_in_flight() {
    let (mut session, _events) = make_session();
    let request = session.submit_free_text("Begin.").expect("first action");
    assert!(matches!(
        session.submit_free_text("Again!"),
        Err(AppError::TurnInFlight)
    ));
    session.complete_turn(request.seq, Ok("[NARRATION]Fine.".to_string()));
    assert!(session.submit_free_text("Again!").is_ok());
}

#[test]
fn test_stale_response_is_discarded() {
    let (mut session, _events) = make_session();
    let request = session.submit_free_text("Begin.").expect("first action");

    // a response tagged with a superseded sequence number is dropped whole
    session.complete_turn(request.seq + 7, Ok("[NARRATION]Ghost turn.[PROGRESS:90]".to_string()));
    assert_eq!(session.phase(), SessionPhase::AwaitingTurn);
    assert_eq!(session.state().progress, 0);

    session.complete_turn(request.seq, Ok("[NARRATION]Real turn.".to_string()));
    assert_eq!(session.phase(), SessionPhase::Presenting);
}

#[test]
fn test_transport_failure_surfaces_in_band_without_side_effects() {
    let (mut session, mut events) = make_session();
    let request = session.submit_free_text("Begin.").expect("first action");
    session.complete_turn(request.seq, Err(AIError::Timeout));

    assert_eq!(session.phase(), SessionPhase::Presenting);
    assert_eq!(session.state().progress, 0);
    let last = session.state().message_history.last().expect("a message");
    assert_eq!(last.message_type, MessageType::System);
    assert_eq!(last.content, TRANSPORT_ERROR_MESSAGE);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, SessionEvent::ErrorOccurred(_)))
    );

    // the player's next action re-attempts a fresh call
    assert!(session.submit_free_text("Try again.").is_ok());
}

#[test]
fn test_empty_completion_gets_its_own_message() {
    let (mut session, _events) = make_session();
    let request = session.submit_free_text("Begin.").expect("first action");
    session.complete_turn(request.seq, Err(AIError::EmptyCompletion));
    let last = session.state().message_history.last().expect("a message");
    assert_eq!(last.content, "unsafe or empty content");
}

#[test]
fn test_resumed_session_presents_stored_history() {
    let mut state = GameState::new("tester__book");
    state
        .message_history
        .push(Message::new(MessageType::Game, "Where we left off.".to_string()));
    let (sender, _receiver) = mpsc::unbounded_channel();
    let session = StorySession::new(state, sender);
    assert_eq!(session.phase(), SessionPhase::Presenting);
}

#[tokio::test]
async fn test_teardown_persists_only_with_discoveries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let save_manager = SaveManager::with_dir(dir.path().to_path_buf());

    // session one: free text only, abandoned — no file
    let (sender, _receiver) = mpsc::unbounded_channel();
    let mut session = StorySession::new(GameState::new("tester__book"), sender)
        .with_persistence(save_manager.debouncer());
    play_turn(&mut session, "Begin.", "[NARRATION]Started.");
    assert!(session.teardown().is_none());
    assert!(!dir.path().join("tester__book.json").exists());

    // session two: one resolved choice — flushed on teardown
    let (sender, _receiver) = mpsc::unbounded_channel();
    let mut session = StorySession::new(GameState::new("tester__book"), sender)
        .with_persistence(save_manager.debouncer());
    play_turn(
        &mut session,
        "Begin.",
        "[NARRATION]A fork in the road.\n[CHOICE]\n⬅️ :: Go left :: pragmatic",
    );
    let request = session.select_choice(0).expect("choice");
    session.complete_turn(request.seq, Ok("[NARRATION]Left it is.[IMPACT:Mud.]".to_string()));
    assert!(session.teardown().is_some());

    let reloaded = save_manager
        .load("tester__book")
        .expect("load should succeed")
        .expect("snapshot should exist");
    assert_eq!(reloaded.discoveries.len(), 1);
    assert_eq!(reloaded.discoveries.iter().next().map(|d| d.outcome.as_str()), Some("Mud."));
}

#[tokio::test]
async fn test_debounced_writes_collapse_and_supersede() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut debouncer = save::Debouncer::new(
        dir.path().to_path_buf(),
        std::time::Duration::from_millis(50),
    );

    let mut state = GameState::new("tester__book");
    state.apply_progress(10);
    debouncer.schedule(state.clone());
    state.apply_progress(10);
    debouncer.schedule(state.clone()); // supersedes the first write

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let reloaded = GameState::load_from_file(&dir.path().join("tester__book.json"))
        .expect("snapshot written");
    assert_eq!(reloaded.progress, 20);

    debouncer.schedule(state.clone());
    debouncer.cancel();
    assert!(!debouncer.has_pending());
}

#[test]
fn test_save_name_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut save_manager = SaveManager::with_dir(dir.path().to_path_buf());
    let save_name = SaveManager::save_name_for("ada", "wuthering-heights");
    assert_eq!(save_name, "ada__wuthering-heights");

    assert!(save_manager.load(&save_name).expect("load").is_none());
    let state = GameState::new(&save_name);
    save_manager.write(&state).expect("write");
    assert!(save_manager.load(&save_name).expect("load").is_some());

    save_manager.delete_save(&save_name).expect("delete");
    assert!(save_manager.load(&save_name).expect("load").is_none());
}
