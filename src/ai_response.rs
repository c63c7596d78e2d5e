// Structured narrator output: the parsed form of one LLM turn.
use crate::tags::{self, Token};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Narration substituted when the response carried nothing actionable.
pub const NARRATION_FAILED: &str = "narration generation failed, retry";

/// Flavor of a player-facing option, used later for behavior analytics.
/// Unknown or misspelled categories silently fall back to `Pragmatic`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ChoiceCategory {
    Existential,
    #[default]
    Pragmatic,
    Absurdist,
}

/// Screen effect requested by the narrator. Unrecognized names are dropped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum VisualEffect {
    Shake,
    Glow,
    Whisper,
}

/// A player-selectable branching option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub icon: Option<String>,
    pub text: String,
    pub category: ChoiceCategory,
}

/// A character butting into the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interruption {
    pub character_name: String,
    pub content: String,
}

/// The parsed result of one story-mode LLM turn.
///
/// Invariant: when `fate_challenge` is set, `choices` is empty — the fate
/// roll replaces normal branching for that turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryResponse {
    pub narration: String,
    pub choices: Vec<Choice>,
    pub progress_delta: Option<i64>,
    pub inventory_add: Option<String>,
    pub inventory_remove: Option<String>,
    pub impact: Option<String>,
    pub flashback: Option<String>,
    pub secret_achievement: Option<String>,
    pub interruption: Option<Interruption>,
    pub visual_effect: Option<VisualEffect>,
    pub fate_challenge: Option<String>,
}

/// The parsed result of a direct character-chat turn: the whole text is the
/// visible content, minus an optional embedded interruption block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub interruption: Option<Interruption>,
}

/// Parse one option line of a `[CHOICE]` block: `icon :: text :: category`.
/// Missing segments are tolerated; lines with no text are dropped.
fn parse_choice_line(line: &str) -> Option<Choice> {
    let segments: Vec<&str> = line.split("::").map(str::trim).collect();
    let (icon, text, category) = match segments.as_slice() {
        [] => return None,
        [text] => (None, *text, ChoiceCategory::default()),
        [icon, text] => (Some(*icon), *text, ChoiceCategory::default()),
        [icon, text, category, ..] => (
            Some(*icon),
            *text,
            category
                .to_lowercase()
                .parse::<ChoiceCategory>()
                .unwrap_or_default(),
        ),
    };
    if text.is_empty() {
        return None;
    }
    Some(Choice {
        icon: icon.filter(|i| !i.is_empty()).map(str::to_string),
        text: text.to_string(),
        category,
    })
}

/// Parse a raw story-mode completion into a [`StoryResponse`].
///
/// Total function: malformed input degrades to a best-effort record instead
/// of erroring. When a tag type occurs more than once, the first occurrence
/// wins; the wire protocol leaves multi-occurrence behavior undefined.
pub fn parse_story_response(raw: &str) -> StoryResponse {
    let mut response = StoryResponse::default();
    let mut narration: Option<String> = None;
    let mut leading_text: Option<String> = None;
    let mut saw_choice_block = false;
    let mut saw_fate = false;

    for token in tags::tokenize(raw) {
        match token {
            Token::Text(text) => {
                if leading_text.is_none() {
                    leading_text = Some(text);
                }
            }
            Token::Narration(text) => {
                if narration.is_none() {
                    narration = Some(text);
                }
            }
            Token::ChoiceBlock(block) => {
                if !saw_choice_block {
                    saw_choice_block = true;
                    response.choices = block
                        .lines()
                        .filter(|line| !line.trim().is_empty())
                        .filter_map(parse_choice_line)
                        .collect();
                }
            }
            Token::FateRoll(challenge) => {
                saw_fate = true;
                if response.fate_challenge.is_none() {
                    response.fate_challenge = Some(challenge.trim().to_string());
                }
            }
            Token::Progress(payload) => {
                if response.progress_delta.is_none() {
                    response.progress_delta = payload.trim().parse::<i64>().ok();
                }
            }
            Token::InventoryAdd(item) => {
                if response.inventory_add.is_none() {
                    response.inventory_add = Some(item.trim().to_string());
                }
            }
            Token::InventoryRemove(item) => {
                if response.inventory_remove.is_none() {
                    response.inventory_remove = Some(item.trim().to_string());
                }
            }
            Token::Impact(text) => {
                if response.impact.is_none() {
                    response.impact = Some(text.trim().to_string());
                }
            }
            Token::Flashback(text) => {
                if response.flashback.is_none() {
                    response.flashback = Some(text.trim().to_string());
                }
            }
            Token::SecretAchievement(title) => {
                if response.secret_achievement.is_none() {
                    response.secret_achievement = Some(title.trim().to_string());
                }
            }
            Token::Interruption { name, content } => {
                if response.interruption.is_none() {
                    response.interruption = Some(Interruption {
                        character_name: name,
                        content,
                    });
                }
            }
            Token::Effect(name) => {
                if response.visual_effect.is_none() {
                    response.visual_effect = name.trim().to_lowercase().parse().ok();
                }
            }
        }
    }

    // No [NARRATION] tag: the prose is whatever came before the first tag,
    // or the entire text when nothing was tagged at all.
    response.narration = narration
        .or(leading_text)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    // Nothing to show and nothing to do: the turn failed. Substitute the
    // fixed error prose and drop any stray directives so the failed turn
    // carries no side effects. A bare fate roll or choice block is
    // legitimate and stays as-is.
    if response.narration.is_empty() && !saw_choice_block && !saw_fate {
        response = StoryResponse {
            narration: NARRATION_FAILED.to_string(),
            ..StoryResponse::default()
        };
    }

    // Fate takes precedence over branching, even when both were emitted.
    if response.fate_challenge.is_some() {
        response.choices.clear();
    }

    response
}

/// Parse a direct character-chat completion. No tags are expected; an
/// embedded interruption block is extracted and stripped from the content.
pub fn parse_chat_response(raw: &str) -> ChatResponse {
    let (content, interruption) = tags::split_interruption(raw);
    ChatResponse {
        content: content.trim().to_string(),
        interruption: interruption.map(|(name, content)| Interruption {
            character_name: name,
            content,
        }),
    }
}
