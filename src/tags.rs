// Single-pass tokenizer for the narrator's tagged wire format.
//
// The narrator emits prose followed by bracketed directive tags:
//
//   [NARRATION]You enter the room.
//   [CHOICE]
//   🔑 :: Open the door :: pragmatic
//   [PROGRESS:10]
//
// Tags are case-sensitive. Anything that does not start a recognized tag is
// plain text and stays attached to the surrounding block, so a stray "[sic]"
// inside the prose never splits it.

/// The kinds of directive the tokenizer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Narration,
    Choice,
    FateRoll,
    Progress,
    InventoryAdd,
    InventoryRemove,
    Impact,
    Flashback,
    SecretAchievement,
    Interruption,
    Effect,
}

/// One token of the narrator response.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Free text appearing before the first recognized tag.
    Text(String),
    /// `[NARRATION]` block, content up to the next recognized tag.
    Narration(String),
    /// `[CHOICE]` block, raw option lines up to the next recognized tag.
    ChoiceBlock(String),
    /// `[FATE_ROLL:challenge]`
    FateRoll(String),
    /// `[PROGRESS:n]`, payload kept raw so the consumer decides how to parse it.
    Progress(String),
    /// `[INVENTORY_ADD:item]`
    InventoryAdd(String),
    /// `[INVENTORY_REMOVE:item]`
    InventoryRemove(String),
    /// `[IMPACT:text]`
    Impact(String),
    /// `[FLASHBACK]...[/FLASHBACK]`
    Flashback(String),
    /// `[SECRET_ACHIEVEMENT:title]`
    SecretAchievement(String),
    /// `[INTERRUPTION:Name:text][/INTERRUPTION]`
    Interruption { name: String, content: String },
    /// `[EFFECT:name]`
    Effect(String),
}

// Opener patterns, longest-prefix unambiguous. Block tags close implicitly at
// the next recognized opener; payload tags close at `]`.
const OPENERS: &[(&str, TagKind)] = &[
    ("[NARRATION]", TagKind::Narration),
    ("[CHOICE]", TagKind::Choice),
    ("[FATE_ROLL:", TagKind::FateRoll),
    ("[PROGRESS:", TagKind::Progress),
    ("[INVENTORY_ADD:", TagKind::InventoryAdd),
    ("[INVENTORY_REMOVE:", TagKind::InventoryRemove),
    ("[IMPACT:", TagKind::Impact),
    ("[FLASHBACK]", TagKind::Flashback),
    ("[SECRET_ACHIEVEMENT:", TagKind::SecretAchievement),
    ("[INTERRUPTION:", TagKind::Interruption),
    ("[EFFECT:", TagKind::Effect),
];

const FLASHBACK_CLOSE: &str = "[/FLASHBACK]";
const INTERRUPTION_CLOSE: &str = "][/INTERRUPTION]";

/// Find the next recognized opener at or after `from`.
fn find_next_opener(raw: &str, from: usize) -> Option<(usize, &'static str, TagKind)> {
    let bytes = raw.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        // '[' is ASCII, so `i` is always a char boundary here.
        if bytes[i] == b'[' {
            for (pattern, kind) in OPENERS {
                if raw[i..].starts_with(pattern) {
                    return Some((i, pattern, *kind));
                }
            }
        }
        i += 1;
    }
    None
}

/// Tokenize a raw narrator completion. Total: malformed input degrades to
/// text or best-effort payloads, it never fails.
pub fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    let Some((first, _, _)) = find_next_opener(raw, 0) else {
        if !raw.is_empty() {
            tokens.push(Token::Text(raw.to_string()));
        }
        return tokens;
    };
    if first > 0 {
        tokens.push(Token::Text(raw[..first].to_string()));
    }

    let mut pos = first;
    while let Some((start, pattern, kind)) = find_next_opener(raw, pos) {
        let body_start = start + pattern.len();
        match kind {
            TagKind::Narration | TagKind::Choice => {
                let end = find_next_opener(raw, body_start)
                    .map(|(next, _, _)| next)
                    .unwrap_or(raw.len());
                let content = raw[body_start..end].to_string();
                tokens.push(match kind {
                    TagKind::Narration => Token::Narration(content),
                    _ => Token::ChoiceBlock(content),
                });
                pos = end;
            }
            TagKind::Flashback => {
                // Runs to the close tag; an unclosed block swallows the rest
                // of the text rather than erroring.
                let (content, end) = match raw[body_start..].find(FLASHBACK_CLOSE) {
                    Some(off) => (
                        raw[body_start..body_start + off].to_string(),
                        body_start + off + FLASHBACK_CLOSE.len(),
                    ),
                    None => (raw[body_start..].to_string(), raw.len()),
                };
                tokens.push(Token::Flashback(content));
                pos = end;
            }
            TagKind::Interruption => {
                // Header carries both the speaker and the line:
                // [INTERRUPTION:Name:text][/INTERRUPTION]
                let (header, end) = match raw[body_start..].find(INTERRUPTION_CLOSE) {
                    Some(off) => (
                        &raw[body_start..body_start + off],
                        body_start + off + INTERRUPTION_CLOSE.len(),
                    ),
                    None => match raw[body_start..].find(']') {
                        Some(off) => (&raw[body_start..body_start + off], body_start + off + 1),
                        None => (&raw[body_start..], raw.len()),
                    },
                };
                let (name, content) = match header.split_once(':') {
                    Some((name, content)) => (name, content),
                    None => (header, ""),
                };
                tokens.push(Token::Interruption {
                    name: name.trim().to_string(),
                    content: content.trim().to_string(),
                });
                pos = end;
            }
            _ => {
                // Single payload tags: everything up to the closing bracket.
                let (payload, end) = match raw[body_start..].find(']') {
                    Some(off) => (&raw[body_start..body_start + off], body_start + off + 1),
                    None => (&raw[body_start..], raw.len()),
                };
                let payload = payload.to_string();
                tokens.push(match kind {
                    TagKind::FateRoll => Token::FateRoll(payload),
                    TagKind::Progress => Token::Progress(payload),
                    TagKind::InventoryAdd => Token::InventoryAdd(payload),
                    TagKind::InventoryRemove => Token::InventoryRemove(payload),
                    TagKind::Impact => Token::Impact(payload),
                    TagKind::SecretAchievement => Token::SecretAchievement(payload),
                    TagKind::Effect => Token::Effect(payload),
                    _ => unreachable!("block tags handled above"),
                });
                pos = end;
            }
        }
    }

    tokens
}

/// Extract an `[INTERRUPTION:Name:text][/INTERRUPTION]` block from free chat
/// text, returning the text with the block removed. Used by the direct
/// character-chat mode, where everything else stays visible verbatim.
pub fn split_interruption(raw: &str) -> (String, Option<(String, String)>) {
    const OPEN: &str = "[INTERRUPTION:";
    let Some(start) = raw.find(OPEN) else {
        return (raw.to_string(), None);
    };
    let body_start = start + OPEN.len();
    let Some(off) = raw[body_start..].find(INTERRUPTION_CLOSE) else {
        // Unclosed block: leave the text untouched.
        return (raw.to_string(), None);
    };
    let header = &raw[body_start..body_start + off];
    let end = body_start + off + INTERRUPTION_CLOSE.len();

    let (name, content) = match header.split_once(':') {
        Some((name, content)) => (name, content),
        None => (header, ""),
    };
    let stripped = format!("{}{}", &raw[..start], &raw[end..]);
    (
        stripped,
        Some((name.trim().to_string(), content.trim().to_string())),
    )
}
