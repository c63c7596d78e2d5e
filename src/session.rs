// The story session state machine. One session per user + book; it owns the
// conversation history, applies parsed narrator responses to the persisted
// snapshot, and emits display/notification events over a channel.
use crate::ai_response::{self, Choice, Interruption, StoryResponse, VisualEffect};
use crate::error::{AIError, AppError, Result};
use crate::fate::{self, FateOutcome};
use crate::game_state::GameState;
use crate::message::{Message, MessageType};
use crate::save::Debouncer;

use tokio::sync::mpsc;

/// Outcome text recorded for a discovery when the narrator emitted no
/// `[IMPACT:...]` tag.
pub const DEFAULT_OUTCOME: &str = "The story moved on without comment.";
/// In-band system message for a failed narrator call.
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "The narrator could not be reached. Your next action will retry.";
/// In-band system message when the narrator returned nothing usable.
pub const EMPTY_COMPLETION_MESSAGE: &str = "unsafe or empty content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No story loaded.
    Idle,
    /// A player action is in flight; input is locked.
    AwaitingTurn,
    /// The latest narration is on screen, choices selectable.
    Presenting,
    /// A fate challenge replaced normal choices and awaits resolution.
    FateRollPending,
}

/// Discrete notifications emitted while a turn is applied.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    MessageAdded(Message),
    ProgressChanged(u8),
    InventoryChanged { item: String, added: bool },
    AchievementUnlocked(String),
    FlashbackShown(String),
    Interrupted(Interruption),
    EffectTriggered(VisualEffect),
    FateRollPending(String),
    FateOutcomeRevealed(FateOutcome),
    ErrorOccurred(String),
}

/// What the player did this turn. Only a selected choice can later produce
/// a discovery; typed free text never does.
#[derive(Debug, Clone)]
pub enum PlayerInput {
    FreeText(String),
    Selected(Choice),
}

/// A prepared narrator call: the conversation to send, tagged with the turn
/// sequence number so a stale response can be told apart from the live one.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub seq: u64,
    pub messages: Vec<Message>,
}

pub struct StorySession {
    phase: SessionPhase,
    state: GameState,
    current_choices: Vec<Choice>,
    pending_choice: Option<Choice>,
    pending_fate: Option<String>,
    turn_seq: u64,
    active: bool,
    events: mpsc::UnboundedSender<SessionEvent>,
    persist: Option<Debouncer>,
}

impl StorySession {
    /// Wrap a fresh or loaded snapshot. A snapshot with history resumes
    /// straight into `Presenting` with the stored messages.
    pub fn new(state: GameState, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        let phase = if state.message_history.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Presenting
        };
        Self {
            phase,
            state,
            current_choices: Vec::new(),
            pending_choice: None,
            pending_fate: None,
            turn_seq: 0,
            active: true,
            events,
            persist: None,
        }
    }

    pub fn with_persistence(mut self, debouncer: Debouncer) -> Self {
        self.persist = Some(debouncer);
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn current_choices(&self) -> &[Choice] {
        &self.current_choices
    }

    pub fn pending_fate(&self) -> Option<&str> {
        self.pending_fate.as_deref()
    }

    /// Submit typed story input as the next player message.
    pub fn submit_free_text(&mut self, text: &str) -> Result<TurnRequest> {
        self.begin_turn(PlayerInput::FreeText(text.to_string()))
    }

    /// Select one of the currently presented choices by index.
    pub fn select_choice(&mut self, index: usize) -> Result<TurnRequest> {
        let choice = self
            .current_choices
            .get(index)
            .cloned()
            .ok_or(AppError::NoSuchChoice)?;
        self.begin_turn(PlayerInput::Selected(choice))
    }

    /// Append the player's action to the conversation and lock input until
    /// the matching response is completed or fails.
    pub fn begin_turn(&mut self, input: PlayerInput) -> Result<TurnRequest> {
        if !self.active {
            return Err(AppError::NoActiveStory);
        }
        match self.phase {
            SessionPhase::AwaitingTurn => return Err(AppError::TurnInFlight),
            SessionPhase::FateRollPending => return Err(AppError::FatePending),
            SessionPhase::Idle | SessionPhase::Presenting => {}
        }

        let (text, choice) = match input {
            PlayerInput::FreeText(text) => (text, None),
            PlayerInput::Selected(choice) => (choice.text.clone(), Some(choice)),
        };
        self.pending_choice = choice;
        self.current_choices.clear();

        let message = Message::new(MessageType::User, text);
        self.state.message_history.push(message.clone());
        let _ = self.events.send(SessionEvent::MessageAdded(message));

        self.turn_seq += 1;
        self.phase = SessionPhase::AwaitingTurn;
        Ok(TurnRequest {
            seq: self.turn_seq,
            messages: self.state.message_history.clone(),
        })
    }

    /// Feed the narrator's raw completion (or its failure) back into the
    /// session. Responses for a superseded turn or a torn-down session are
    /// discarded whole.
    pub fn complete_turn(&mut self, seq: u64, result: std::result::Result<String, AIError>) {
        if !self.active || self.phase != SessionPhase::AwaitingTurn || seq != self.turn_seq {
            log::debug!("Discarding stale narrator response for turn {seq}");
            return;
        }
        match result {
            Ok(raw) => self.apply_response(ai_response::parse_story_response(&raw)),
            Err(AIError::EmptyCompletion) => self.fail_turn(EMPTY_COMPLETION_MESSAGE),
            Err(e) => {
                log::warn!("Narrator call failed: {e:#}");
                self.fail_turn(TRANSPORT_ERROR_MESSAGE);
            }
        }
    }

    /// Soft failure: surface a system message in the visible list, apply no
    /// side effects, and hand control back to the player.
    fn fail_turn(&mut self, text: &str) {
        self.pending_choice = None;
        let message = Message::new(MessageType::System, text.to_string());
        self.state.message_history.push(message.clone());
        let _ = self.events.send(SessionEvent::MessageAdded(message));
        let _ = self.events.send(SessionEvent::ErrorOccurred(text.to_string()));
        self.phase = SessionPhase::Presenting;
    }

    // Side effects run in a fixed order: discovery, progress, inventory,
    // achievement, flashback, then the fate check, which short-circuits
    // presentation for the turn.
    fn apply_response(&mut self, response: StoryResponse) {
        // A fate-roll response leaves the choice unresolved: no discovery.
        if let Some(choice) = self.pending_choice.take() {
            if response.fate_challenge.is_none() {
                let outcome = response
                    .impact
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OUTCOME.to_string());
                self.state.discoveries.record(&choice, &outcome);
                self.schedule_persist();
            }
        }

        if let Some(delta) = response.progress_delta {
            let progress = self.state.apply_progress(delta);
            let _ = self.events.send(SessionEvent::ProgressChanged(progress));
        }

        if let Some(item) = &response.inventory_add {
            if self.state.add_item(item) {
                let _ = self.events.send(SessionEvent::InventoryChanged {
                    item: item.clone(),
                    added: true,
                });
            }
        }
        if let Some(item) = &response.inventory_remove {
            if self.state.remove_item(item) {
                let _ = self.events.send(SessionEvent::InventoryChanged {
                    item: item.clone(),
                    added: false,
                });
            }
        }

        if let Some(title) = &response.secret_achievement {
            if self.state.unlock_achievement(title) {
                let _ = self
                    .events
                    .send(SessionEvent::AchievementUnlocked(title.clone()));
            }
        }

        if let Some(text) = &response.flashback {
            let _ = self.events.send(SessionEvent::FlashbackShown(text.clone()));
        }
        if let Some(interruption) = &response.interruption {
            let _ = self
                .events
                .send(SessionEvent::Interrupted(interruption.clone()));
        }
        if let Some(effect) = response.visual_effect {
            let _ = self.events.send(SessionEvent::EffectTriggered(effect));
        }

        // A fate turn shows only the challenge prompt; its record never
        // reaches the visible message list.
        if let Some(challenge) = response.fate_challenge {
            self.pending_fate = Some(challenge.clone());
            self.phase = SessionPhase::FateRollPending;
            let _ = self.events.send(SessionEvent::FateRollPending(challenge));
            return;
        }

        self.current_choices = response.choices.clone();
        let message = Message::new(MessageType::Game, response.narration.clone());
        self.state.message_history.push(message.clone());
        let _ = self.events.send(SessionEvent::MessageAdded(message));
        self.phase = SessionPhase::Presenting;
    }

    /// Draw the fate outcome and feed its resolution string back into the
    /// conversation as the player's next input. The presentation layer is
    /// responsible for the suspense and reveal delays around this call.
    pub fn resolve_fate(&mut self) -> Result<(FateOutcome, TurnRequest)> {
        let outcome = fate::roll_fate();
        self.resolve_fate_as(outcome)
    }

    /// Commit a specific fate outcome; split out so tests stay deterministic.
    pub fn resolve_fate_as(&mut self, outcome: FateOutcome) -> Result<(FateOutcome, TurnRequest)> {
        if self.phase != SessionPhase::FateRollPending {
            return Err(AppError::NoFatePending);
        }
        self.pending_fate = None;
        let _ = self.events.send(SessionEvent::FateOutcomeRevealed(outcome));
        self.phase = SessionPhase::Presenting;
        let request = self.begin_turn(PlayerInput::FreeText(
            outcome.resolution_message().to_string(),
        ))?;
        Ok((outcome, request))
    }

    fn schedule_persist(&mut self) {
        if let Some(debouncer) = &mut self.persist {
            debouncer.schedule(self.state.clone());
        }
    }

    /// Leave the story. Sessions with no resolved choices are abandoned
    /// without a write; everything else is flushed immediately. Returns the
    /// final snapshot when one was persisted.
    pub fn teardown(&mut self) -> Option<GameState> {
        self.active = false;
        self.phase = SessionPhase::Idle;
        if self.state.discoveries.is_empty() {
            if let Some(debouncer) = &mut self.persist {
                debouncer.cancel();
            }
            return None;
        }
        if let Some(debouncer) = &mut self.persist {
            debouncer.flush(&self.state);
        }
        Some(self.state.clone())
    }
}
