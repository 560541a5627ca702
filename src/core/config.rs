/// Runtime configuration, loaded once at startup from RON.
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::responder::MAX_REPLY_LENGTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Default cap on lines pulled from the corpus per reply.
pub const DEFAULT_MAX_LOADED_LINES: usize = 20_000;

/// Settings for the chat subsystem. Every field has a default, so a config
/// file only needs the keys it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// The bot's own nick; lines containing it are treated as addressed.
    pub nick: String,
    /// Senders whose lines are never stored or answered. Accepts a list or
    /// a single whitespace-separated string.
    #[serde(deserialize_with = "nick_list")]
    pub ignore_nicks: Vec<String>,
    /// Upper bound on lines sampled to build a reply model.
    pub max_loaded_lines: usize,
    /// Upper bound on reply length in characters.
    pub max_reply_length: usize,
    /// Directory holding `ai.sqlite` and `ai.json`.
    pub data_dir: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            nick: "chatter".to_string(),
            ignore_nicks: Vec::new(),
            max_loaded_lines: DEFAULT_MAX_LOADED_LINES,
            max_reply_length: MAX_REPLY_LENGTH,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ChatConfig {
    /// Parse a config from a RON string.
    pub fn parse_ron(input: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Load a config from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse_ron(&contents)?;
        log::debug!("[config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join("ai.sqlite")
    }

    pub fn activation_path(&self) -> PathBuf {
        self.data_dir.join("ai.json")
    }

    /// Whether `nick` is the bot itself or on the ignore list.
    pub fn is_ignored(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.nick)
            || self
                .ignore_nicks
                .iter()
                .any(|n| n.eq_ignore_ascii_case(nick))
    }
}

fn nick_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Nicks {
        Spaced(String),
        List(Vec<String>),
    }

    Ok(match Nicks::deserialize(deserializer)? {
        Nicks::Spaced(s) => s.split_whitespace().map(str::to_string).collect(),
        Nicks::List(v) => v,
    })
}
