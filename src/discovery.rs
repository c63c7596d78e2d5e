// The discovery ledger: one record per resolved player-initiated choice,
// pairing the option taken with its narrative consequence.
use crate::ai_response::{Choice, ChoiceCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::IntoEnumIterator;

/// An immutable record of one resolved choice. Never created for fate-roll
/// turns, free-text story input, or the scene-opening turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub choice_text: String,
    pub category: ChoiceCategory,
    pub outcome: String,
}

/// Append-only log of discoveries, persisted with the session snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryLedger {
    entries: Vec<Discovery>,
}

impl DiscoveryLedger {
    /// The sole mutator. Entries are never edited or removed afterwards.
    pub fn record(&mut self, choice: &Choice, outcome: &str) {
        self.entries.push(Discovery {
            choice_text: choice.text.clone(),
            category: choice.category,
            outcome: outcome.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered replay, oldest first, for the timeline view.
    pub fn iter(&self) -> impl Iterator<Item = &Discovery> {
        self.entries.iter()
    }

    /// Normalized share of each category across all resolved choices.
    /// Empty while no choice has been resolved yet.
    pub fn category_distribution(&self) -> HashMap<ChoiceCategory, f64> {
        let total = self.entries.len();
        if total == 0 {
            return HashMap::new();
        }
        ChoiceCategory::iter()
            .map(|category| {
                let count = self
                    .entries
                    .iter()
                    .filter(|d| d.category == category)
                    .count();
                (category, count as f64 / total as f64)
            })
            .collect()
    }
}
