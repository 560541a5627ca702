use serde::{Deserialize, Serialize};

/// One line of chat as delivered by the host connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Nick of whoever sent the line.
    pub sender: String,
    /// Channel or room the line was said in.
    pub scope: String,
    /// Raw text, formatting and surrounding whitespace included.
    pub text: String,
}

impl ChatLine {
    pub fn new(sender: &str, scope: &str, text: &str) -> Self {
        Self {
            sender: sender.to_string(),
            scope: scope.to_string(),
            text: text.to_string(),
        }
    }

    /// Whether the text mentions `nick` anywhere, ignoring case.
    pub fn mentions(&self, nick: &str) -> bool {
        !nick.is_empty() && self.text.to_lowercase().contains(&nick.to_lowercase())
    }
}
