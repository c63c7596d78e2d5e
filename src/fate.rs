// Fate rolls: a randomized pass/fail mini-event replacing normal choices at
// scripted dramatic moments.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::Display;

// Minimum time the challenge stays on screen before the outcome is computed.
pub const SUSPENSE_DURATION: Duration = Duration::from_millis(2500);
// Further delay before the outcome is fed back into the conversation.
pub const REVEAL_DURATION: Duration = Duration::from_millis(1500);

// Outcome of a single fate roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum FateOutcome {
    Success,
    Failure,
}

impl FateOutcome {
    // The literal resolution string committed back into the conversation as
    // the player's next input once the reveal delay has elapsed.
    pub fn resolution_message(&self) -> &'static str {
        match self {
            FateOutcome::Success => "[FATE_RESULT:SUCCESS] Fortune favors me this time.",
            FateOutcome::Failure => "[FATE_RESULT:FAILURE] The roll goes against me.",
        }
    }
}

// Function to resolve a fate roll. Each call is an independent Bernoulli
// trial with p = 0.5; the resolver holds no state between calls.
pub fn roll_fate() -> FateOutcome {
    roll_fate_with(&mut rand::rng())
}

// Helper taking an explicit RNG so the draw itself stays testable.
pub fn roll_fate_with(rng: &mut impl Rng) -> FateOutcome {
    if rng.random_bool(0.5) {
        FateOutcome::Success
    } else {
        FateOutcome::Failure
    }
}
