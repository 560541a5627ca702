/// The ingestion and reply pipeline: ChatLine → store or reply.
///
/// Wires together the message filter, corpus store, activation registry
/// and response generator, and exposes the toggle/status command.
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::core::activation::{
    ActivationError, ActivationPersistence, ActivationRegistry, JsonFileActivation,
};
use crate::core::config::{ChatConfig, ConfigError};
use crate::core::corpus::{CorpusError, CorpusStore, SqliteCorpus};
use crate::core::filter::should_ignore;
use crate::core::privilege::PrivilegeCheck;
use crate::core::responder;
use crate::schema::line::ChatLine;
use crate::schema::status::CorpusStatus;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("activation error: {0}")]
    Activation(#[from] ActivationError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Receives replies produced by the bot. Implemented by the host connection.
pub trait ReplySink {
    fn send_reply(&mut self, scope: &str, text: &str);
}

/// Collects replies as `(scope, text)` pairs.
impl ReplySink for Vec<(String, String)> {
    fn send_reply(&mut self, scope: &str, text: &str) {
        self.push((scope.to_string(), text.to_string()));
    }
}

/// What happened to a single incoming line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// From an ignored sender, or noise such as a command.
    Ignored,
    /// Not addressed to the bot; added to the corpus.
    Stored,
    /// Not addressed to the bot; the text was already in the corpus.
    Duplicate,
    /// Addressed to the bot in a scope where it is switched off.
    Unanswered,
    /// Addressed in an active scope but the corpus had nothing to sample.
    NoCorpus,
    /// A generated reply was sent.
    Replied,
    /// Generation produced nothing usable; a filler reply was sent.
    FellBack,
    /// The corpus store failed; the line was dropped.
    StoreFailed,
}

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Enabled,
    Disabled,
    /// The sender lacks operator privilege in the scope.
    Denied,
}

/// The chat subsystem. Built via `Chatbot::builder()`.
pub struct Chatbot {
    config: ChatConfig,
    corpus: Box<dyn CorpusStore>,
    activation: ActivationRegistry,
    rng: StdRng,
}

/// Builder for constructing a `Chatbot`.
pub struct ChatbotBuilder {
    config: ChatConfig,
    seed: Option<u64>,
    /// Directly provided corpus (for testing without files).
    corpus: Option<Box<dyn CorpusStore>>,
    /// Directly provided activation persistence (for testing without files).
    activation: Option<Box<dyn ActivationPersistence>>,
}

impl Chatbot {
    pub fn builder() -> ChatbotBuilder {
        ChatbotBuilder {
            config: ChatConfig::default(),
            seed: None,
            corpus: None,
            activation: None,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn corpus(&self) -> &dyn CorpusStore {
        self.corpus.as_ref()
    }

    pub fn is_active(&self, scope: &str) -> bool {
        self.activation.is_active(scope)
    }

    /// Process one incoming line, sending at most one reply through `sink`.
    ///
    /// Storage failures are logged and absorbed; the line is dropped.
    pub fn handle_line(&mut self, line: &ChatLine, sink: &mut dyn ReplySink) -> LineOutcome {
        if self.config.is_ignored(&line.sender) {
            return LineOutcome::Ignored;
        }

        let text = line.text.trim();
        if should_ignore(text) {
            return LineOutcome::Ignored;
        }

        // Only lines that don't mention the bot are training data
        if !line.mentions(&self.config.nick) {
            return match self.corpus.add_line(text, &line.scope) {
                Ok(true) => LineOutcome::Stored,
                Ok(false) => LineOutcome::Duplicate,
                Err(e) => {
                    log::warn!("[chatter] Failed to store line from {}: {}", line.scope, e);
                    LineOutcome::StoreFailed
                }
            };
        }

        if !self.activation.is_active(&line.scope) {
            return LineOutcome::Unanswered;
        }

        let corpus = match self.corpus.sample(None, self.config.max_loaded_lines) {
            Ok(Some(lines)) => lines,
            Ok(None) => {
                log::warn!("[chatter] Not enough lines in corpus to generate a reply");
                return LineOutcome::NoCorpus;
            }
            Err(e) => {
                log::warn!("[chatter] Could not sample corpus: {}", e);
                return LineOutcome::StoreFailed;
            }
        };

        match responder::generate(&corpus, self.config.max_reply_length, &mut self.rng) {
            Some(reply) => {
                sink.send_reply(&line.scope, reply.trim());
                LineOutcome::Replied
            }
            None => {
                sink.send_reply(&line.scope, responder::fallback_reply(&mut self.rng));
                LineOutcome::FellBack
            }
        }
    }

    /// Switch replies on or off in `scope`, if `sender` is an operator there.
    pub fn toggle(
        &mut self,
        scope: &str,
        sender: &str,
        privilege: &dyn PrivilegeCheck,
    ) -> Result<ToggleOutcome, ChatError> {
        if !privilege.is_operator(scope, sender) {
            log::debug!("[chatter] {} may not toggle {}", sender, scope);
            return Ok(ToggleOutcome::Denied);
        }

        Ok(if self.activation.toggle(scope)? {
            ToggleOutcome::Enabled
        } else {
            ToggleOutcome::Disabled
        })
    }

    /// Line counts and activation state for `scope`.
    pub fn status(&self, scope: &str) -> Result<CorpusStatus, ChatError> {
        let global_count = self.corpus.count(None)?;
        let scope_count = self.corpus.count(Some(scope))?;
        Ok(CorpusStatus::new(
            scope,
            global_count,
            scope_count,
            self.activation.is_active(scope),
        ))
    }

    /// The `ai [--status]` command: returns the text to send back.
    pub fn command(
        &mut self,
        scope: &str,
        sender: &str,
        show_status: bool,
        privilege: &dyn PrivilegeCheck,
    ) -> Result<String, ChatError> {
        if show_status {
            return Ok(self.status(scope)?.to_string());
        }

        Ok(match self.toggle(scope, sender, privilege)? {
            ToggleOutcome::Denied => {
                "You must be a channel operator (% and above) to do that.".to_string()
            }
            ToggleOutcome::Enabled => "Chatbot activated.".to_string(),
            ToggleOutcome::Disabled => "Shutting up!".to_string(),
        })
    }
}

impl ChatbotBuilder {
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide a corpus store directly (for testing without files).
    pub fn with_corpus(mut self, corpus: Box<dyn CorpusStore>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    /// Provide activation persistence directly (for testing without files).
    pub fn with_activation(mut self, activation: Box<dyn ActivationPersistence>) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Open anything not provided directly under the configured data directory.
    pub fn build(self) -> Result<Chatbot, ChatError> {
        let corpus = match self.corpus {
            Some(corpus) => corpus,
            None => Box::new(SqliteCorpus::open(self.config.corpus_path())?),
        };

        let persistence = match self.activation {
            Some(persistence) => persistence,
            None => Box::new(JsonFileActivation::new(self.config.activation_path())),
        };
        let activation = ActivationRegistry::load(persistence)?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!(
            "[chatter] Ready as {} ({} active scopes)",
            self.config.nick,
            activation.active_scopes().count()
        );

        Ok(Chatbot {
            config: self.config,
            corpus,
            activation,
            rng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::activation::MemoryActivation;
    use crate::core::privilege::ChannelModes;
    use crate::core::responder::FALLBACK_REPLIES;

    /// A corpus whose backing file has gone away.
    struct UnreachableCorpus;

    fn disk_gone() -> CorpusError {
        std::io::Error::new(std::io::ErrorKind::NotFound, "disk gone").into()
    }

    impl CorpusStore for UnreachableCorpus {
        fn add_line(&self, _text: &str, _scope: &str) -> Result<bool, CorpusError> {
            Err(disk_gone())
        }

        fn sample(
            &self,
            _scope: Option<&str>,
            _limit: usize,
        ) -> Result<Option<Vec<String>>, CorpusError> {
            Err(disk_gone())
        }

        fn count(&self, _scope: Option<&str>) -> Result<u64, CorpusError> {
            Err(disk_gone())
        }
    }

    /// Loads fine, refuses every write.
    struct ReadOnlyActivation;

    impl ActivationPersistence for ReadOnlyActivation {
        fn load(&self) -> Result<Vec<String>, ActivationError> {
            Ok(Vec::new())
        }

        fn save(&self, _scopes: &[String]) -> Result<(), ActivationError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    fn build_test_bot(active: &[&str]) -> Chatbot {
        let config = ChatConfig {
            nick: "chatter".to_string(),
            ignore_nicks: vec!["spambot".to_string()],
            ..ChatConfig::default()
        };
        Chatbot::builder()
            .config(config)
            .seed(42)
            .with_corpus(Box::new(SqliteCorpus::in_memory().unwrap()))
            .with_activation(Box::new(MemoryActivation::with_scopes(active)))
            .build()
            .unwrap()
    }

    fn feed_fixture(bot: &mut Chatbot, scope: &str) {
        let corpus = std::fs::read_to_string("tests/fixtures/chat_corpus.txt").unwrap();
        let mut sink: Vec<(String, String)> = Vec::new();
        for text in corpus.lines() {
            bot.handle_line(&ChatLine::new("alice", scope, text), &mut sink);
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn passive_line_is_stored_without_reply() {
        let mut bot = build_test_bot(&[]);
        let mut sink: Vec<(String, String)> = Vec::new();

        let outcome = bot.handle_line(&ChatLine::new("alice", "#rice", "  nice weather  "), &mut sink);
        assert_eq!(outcome, LineOutcome::Stored);
        assert!(sink.is_empty());
        assert_eq!(bot.corpus().count(Some("#rice")).unwrap(), 1);

        let again = bot.handle_line(&ChatLine::new("bob", "#other", "nice weather"), &mut sink);
        assert_eq!(again, LineOutcome::Duplicate);
        assert_eq!(bot.corpus().count(None).unwrap(), 1);
    }

    #[test]
    fn passive_line_in_active_scope_gets_no_reply() {
        let mut bot = build_test_bot(&["#rice"]);
        feed_fixture(&mut bot, "#rice");
        let mut sink: Vec<(String, String)> = Vec::new();
        let outcome = bot.handle_line(&ChatLine::new("alice", "#rice", "just chatting"), &mut sink);
        assert_eq!(outcome, LineOutcome::Stored);
        assert!(sink.is_empty());
    }

    #[test]
    fn ignored_senders_and_noise_are_dropped() {
        let mut bot = build_test_bot(&["#rice"]);
        let mut sink: Vec<(String, String)> = Vec::new();

        for line in [
            ChatLine::new("spambot", "#rice", "buy things"),
            ChatLine::new("Chatter", "#rice", "my own echo"),
            ChatLine::new("alice", "#rice", "!help"),
            ChatLine::new("alice", "#rice", "s/foo/bar/"),
            ChatLine::new("alice", "#rice", "   "),
        ] {
            assert_eq!(bot.handle_line(&line, &mut sink), LineOutcome::Ignored);
        }
        assert_eq!(bot.corpus().count(None).unwrap(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn addressed_line_in_disabled_scope_is_neither_stored_nor_answered() {
        let mut bot = build_test_bot(&[]);
        feed_fixture(&mut bot, "#rice");
        let before = bot.corpus().count(None).unwrap();

        let mut sink: Vec<(String, String)> = Vec::new();
        let outcome =
            bot.handle_line(&ChatLine::new("alice", "#rice", "chatter: are you there"), &mut sink);
        assert_eq!(outcome, LineOutcome::Unanswered);
        assert!(sink.is_empty());
        assert_eq!(bot.corpus().count(None).unwrap(), before);
    }

    #[test]
    fn addressed_line_with_empty_corpus_gets_no_reply() {
        let mut bot = build_test_bot(&["#rice"]);
        let mut sink: Vec<(String, String)> = Vec::new();
        let outcome = bot.handle_line(&ChatLine::new("alice", "#rice", "hi CHATTER"), &mut sink);
        // NoCorpus is only returned alongside the empty-corpus warning.
        assert_eq!(outcome, LineOutcome::NoCorpus);
        assert!(sink.is_empty());
    }

    #[test]
    fn storage_failures_are_absorbed_without_reply() {
        let mut bot = Chatbot::builder()
            .seed(42)
            .with_corpus(Box::new(UnreachableCorpus))
            .with_activation(Box::new(MemoryActivation::with_scopes(&["#rice"])))
            .build()
            .unwrap();
        let mut sink: Vec<(String, String)> = Vec::new();

        // StoreFailed is only returned alongside the storage warning.
        let passive = bot.handle_line(&ChatLine::new("alice", "#rice", "nice weather"), &mut sink);
        assert_eq!(passive, LineOutcome::StoreFailed);
        let addressed =
            bot.handle_line(&ChatLine::new("alice", "#rice", "chatter, say something"), &mut sink);
        assert_eq!(addressed, LineOutcome::StoreFailed);
        assert!(sink.is_empty());

        assert!(matches!(bot.status("#rice"), Err(ChatError::Corpus(_))));
    }

    #[test]
    fn addressed_line_in_active_scope_gets_exactly_one_reply() {
        let mut bot = build_test_bot(&["#rice"]);
        feed_fixture(&mut bot, "#rice");

        let mut sink: Vec<(String, String)> = Vec::new();
        let outcome =
            bot.handle_line(&ChatLine::new("alice", "#rice", "chatter, say something"), &mut sink);
        assert!(matches!(outcome, LineOutcome::Replied | LineOutcome::FellBack));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].0, "#rice");
        assert_eq!(sink[0].1, sink[0].1.trim());
        assert!(sink[0].1.chars().count() <= 180);
    }

    #[test]
    fn degenerate_corpus_falls_back_to_filler() {
        let mut bot = build_test_bot(&["#rice"]);
        let mut sink: Vec<(String, String)> = Vec::new();
        bot.handle_line(&ChatLine::new("alice", "#rice", "a b c"), &mut sink);

        let outcome = bot.handle_line(&ChatLine::new("alice", "#rice", "chatter?"), &mut sink);
        assert_eq!(outcome, LineOutcome::FellBack);
        assert_eq!(sink.len(), 1);
        assert!(FALLBACK_REPLIES.contains(&sink[0].1.as_str()));
    }

    #[test]
    fn reply_samples_the_global_corpus() {
        let mut bot = build_test_bot(&["#quiet"]);
        feed_fixture(&mut bot, "#busy");

        let mut sink: Vec<(String, String)> = Vec::new();
        let outcome = bot.handle_line(&ChatLine::new("alice", "#quiet", "chatter hello"), &mut sink);
        assert_ne!(outcome, LineOutcome::NoCorpus);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn toggle_requires_operator() {
        let mut bot = build_test_bot(&[]);
        let mut modes = ChannelModes::new();
        modes.grant("#rice", '@', "op");

        assert_eq!(bot.toggle("#rice", "pleb", &modes).unwrap(), ToggleOutcome::Denied);
        assert!(!bot.is_active("#rice"));

        assert_eq!(bot.toggle("#rice", "op", &modes).unwrap(), ToggleOutcome::Enabled);
        assert!(bot.is_active("#rice"));
        assert_eq!(bot.toggle("#rice", "op", &modes).unwrap(), ToggleOutcome::Disabled);
        assert!(!bot.is_active("#rice"));
    }

    #[test]
    fn command_renders_replies() {
        let mut bot = build_test_bot(&[]);
        let mut sink: Vec<(String, String)> = Vec::new();
        bot.handle_line(&ChatLine::new("alice", "#rice", "one line here"), &mut sink);
        bot.handle_line(&ChatLine::new("alice", "#other", "another line there"), &mut sink);
        bot.handle_line(&ChatLine::new("alice", "#other", "third line there"), &mut sink);
        let op = |_: &str, nick: &str| nick == "op";

        assert_eq!(
            bot.command("#rice", "anyone", true, &op).unwrap(),
            "Chatbot is currently disabled for #rice. Channel/global line count: 1/3 (33%)."
        );
        assert_eq!(
            bot.command("#rice", "pleb", false, &op).unwrap(),
            "You must be a channel operator (% and above) to do that."
        );
        assert_eq!(bot.command("#rice", "op", false, &op).unwrap(), "Chatbot activated.");
        assert!(bot
            .command("#rice", "op", true, &op)
            .unwrap()
            .starts_with("Chatbot is currently enabled for #rice."));
        assert_eq!(bot.command("#rice", "op", false, &op).unwrap(), "Shutting up!");
    }

    #[test]
    fn failed_activation_write_reaches_the_command_layer() {
        let mut bot = Chatbot::builder()
            .seed(42)
            .with_corpus(Box::new(SqliteCorpus::in_memory().unwrap()))
            .with_activation(Box::new(ReadOnlyActivation))
            .build()
            .unwrap();
        let everyone = |_: &str, _: &str| true;

        let result = bot.command("#rice", "op", false, &everyone);
        assert!(matches!(result, Err(ChatError::Activation(_))));
        assert!(!bot.is_active("#rice"));
        assert!(bot
            .command("#rice", "op", true, &everyone)
            .unwrap()
            .starts_with("Chatbot is currently disabled for #rice."));
    }

    #[test]
    fn status_of_empty_corpus_is_zero_percent() {
        let bot = build_test_bot(&["#rice"]);
        let status = bot.status("#rice").unwrap();
        assert_eq!(status.global_count, 0);
        assert_eq!(status.percentage, 0);
        assert!(status.active);
    }

    #[test]
    fn builder_opens_stores_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChatConfig {
            data_dir: dir.path().join("data"),
            ..ChatConfig::default()
        };
        let mut bot = Chatbot::builder().config(config.clone()).seed(1).build().unwrap();
        let everyone = |_: &str, _: &str| true;
        bot.toggle("#rice", "op", &everyone).unwrap();
        drop(bot);

        assert!(config.corpus_path().exists());
        let reopened = Chatbot::builder().config(config).build().unwrap();
        assert!(reopened.is_active("#rice"));
    }
}
