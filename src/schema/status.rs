use serde::{Deserialize, Serialize};
use std::fmt;

/// Corpus statistics for one scope, as reported by the status command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStatus {
    pub scope: String,
    pub global_count: u64,
    pub scope_count: u64,
    pub active: bool,
    /// Share of the global corpus contributed by this scope, 0..=100.
    pub percentage: u32,
}

impl CorpusStatus {
    pub fn new(scope: &str, global_count: u64, scope_count: u64, active: bool) -> Self {
        Self {
            scope: scope.to_string(),
            global_count,
            scope_count,
            active,
            percentage: percentage(scope_count, global_count),
        }
    }
}

/// `round(100 * part / whole)` with halves going to the even neighbour,
/// or 0 for an empty whole.
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round_ties_even() as u32
}

impl fmt::Display for CorpusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chatbot is currently {} for {}. Channel/global line count: {}/{} ({}%).",
            if self.active { "enabled" } else { "disabled" },
            self.scope,
            self.scope_count,
            self.global_count,
            self.percentage
        )
    }
}
