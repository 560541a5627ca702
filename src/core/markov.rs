/// Markov chain sentence generator — line-oriented training and generation.
///
/// Every input line is its own training sequence: the chain never walks
/// from the end of one line into the start of another.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("no data for generation (model is empty)")]
    NoData,
    #[error("no acceptable sentence after {0} attempts")]
    NoSentence(usize),
}

/// Special token marking sentence start.
const SENTENCE_START: &str = "___BEGIN__";
/// Special token marking sentence end.
const SENTENCE_END: &str = "___END__";

/// Lines with quotes, brackets or dangling apostrophes make the chain
/// emit unbalanced output, so they are left out of training.
fn rejected_input() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(^')|('$)|\s'|'\s|["()\[\]]"#).expect("input filter pattern is valid")
    })
}

/// Knobs for sentence construction.
#[derive(Debug, Clone)]
pub struct SentenceOptions {
    /// Walks attempted per sentence (and sentences per short sentence).
    pub tries: usize,
    /// Longest run of words, as a share of the sentence, that may be copied
    /// verbatim from the training text.
    pub max_overlap_ratio: f64,
    /// Absolute cap on the verbatim run length.
    pub max_overlap_total: usize,
    /// Whether to apply the overlap test at all.
    pub test_output: bool,
    /// Walks longer than this are abandoned.
    pub max_words: usize,
}

impl Default for SentenceOptions {
    fn default() -> Self {
        Self {
            tries: 10,
            max_overlap_ratio: 0.7,
            max_overlap_total: 15,
            test_output: true,
            max_words: 100,
        }
    }
}

/// A trained Markov model storing n-gram transition tables.
#[derive(Debug, Clone, Default)]
pub struct MarkovModel {
    /// N-gram depth (e.g., 3 for a chain keyed on the two previous words).
    pub n: usize,
    /// Transition table: n-gram prefix → [(next_token, count)].
    pub transitions: FxHashMap<Vec<String>, Vec<(String, u32)>>,
    /// Accepted training lines joined by newlines, for the overlap test.
    rejoined: String,
    /// Number of lines that made it into the chain.
    lines: usize,
}

impl MarkovModel {
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// How many input lines were used for training.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Walk the chain from a sentence start to a sentence end.
    ///
    /// Returns `None` on a dead end or when the walk exceeds `max_words`.
    fn walk(&self, rng: &mut StdRng, max_words: usize) -> Option<Vec<String>> {
        let mut words: Vec<String> = Vec::new();
        let mut state: Vec<String> = vec![SENTENCE_START.to_string(); self.n - 1];

        loop {
            let next = pick_next(&self.transitions, &state, rng)?;
            if next == SENTENCE_END {
                break;
            }
            if words.len() >= max_words {
                return None;
            }

            words.push(next.clone());

            // Slide state window
            state.push(next);
            if state.len() > self.n - 1 {
                state.remove(0);
            }
        }

        if words.is_empty() {
            None
        } else {
            Some(words)
        }
    }

    /// Reject walks that reproduce too long a run of any training line.
    fn is_novel(&self, words: &[String], opts: &SentenceOptions) -> bool {
        let overlap_max = overlap_limit(words.len(), opts);
        let overlap_over = overlap_max + 1;
        let gram_count = words.len().saturating_sub(overlap_max).max(1);

        for i in 0..gram_count {
            let end = (i + overlap_over).min(words.len());
            let gram = words[i..end].join(" ");
            if self.rejoined.contains(&gram) {
                return false;
            }
        }
        true
    }

    /// Generate one sentence, retrying up to `opts.tries` walks.
    pub fn make_sentence(
        &self,
        rng: &mut StdRng,
        opts: &SentenceOptions,
    ) -> Result<String, MarkovError> {
        if self.is_empty() {
            return Err(MarkovError::NoData);
        }

        for _ in 0..opts.tries {
            let words = match self.walk(rng, opts.max_words) {
                Some(words) => words,
                None => continue,
            };
            if opts.test_output && !self.is_novel(&words, opts) {
                continue;
            }
            return Ok(words.join(" "));
        }

        Err(MarkovError::NoSentence(opts.tries))
    }

    /// Generate one sentence of at most `max_chars` characters.
    pub fn make_short_sentence(
        &self,
        rng: &mut StdRng,
        max_chars: usize,
        opts: &SentenceOptions,
    ) -> Result<String, MarkovError> {
        for _ in 0..opts.tries {
            match self.make_sentence(rng, opts) {
                Ok(sentence) if sentence.chars().count() <= max_chars => return Ok(sentence),
                Ok(_) | Err(MarkovError::NoSentence(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(MarkovError::NoSentence(opts.tries * opts.tries))
    }
}

/// Longest verbatim run a sentence of `len` words may share with the
/// training text. Halves round to even, so 15 words allow 10, not 11.
fn overlap_limit(len: usize, opts: &SentenceOptions) -> usize {
    let ratio = (opts.max_overlap_ratio * len as f64).round_ties_even() as usize;
    opts.max_overlap_total.min(ratio)
}

/// Pick the next token from transitions given a state prefix.
fn pick_next(
    transitions: &FxHashMap<Vec<String>, Vec<(String, u32)>>,
    state: &[String],
    rng: &mut StdRng,
) -> Option<String> {
    let options = transitions.get(state)?;
    if options.is_empty() {
        return None;
    }

    let weights: Vec<u32> = options.iter().map(|(_, count)| *count).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(options[dist.sample(rng)].0.clone())
}

/// Builds Markov models from chat lines.
pub struct MarkovTrainer;

impl MarkovTrainer {
    /// Train from newline-separated text, one training sequence per line.
    pub fn train(text: &str, n: usize) -> MarkovModel {
        Self::train_lines(text.lines(), n)
    }

    /// Train from individual lines with the given n-gram depth.
    pub fn train_lines<I, S>(lines: I, n: usize) -> MarkovModel
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        assert!((2..=4).contains(&n), "n-gram depth must be 2-4");

        let mut transitions: FxHashMap<Vec<String>, Vec<(String, u32)>> = FxHashMap::default();
        let mut accepted: Vec<String> = Vec::new();

        for line in lines {
            let trimmed = line.as_ref().trim();
            if trimmed.is_empty() || !accepts_input(trimmed) {
                continue;
            }

            let words: Vec<&str> = trimmed.split_whitespace().collect();
            let mut padded = vec![SENTENCE_START.to_string(); n - 1];
            padded.extend(words.iter().map(|w| w.to_string()));
            padded.push(SENTENCE_END.to_string());

            for window in padded.windows(n) {
                let prefix: Vec<String> = window[..n - 1].to_vec();
                let next = window[n - 1].clone();
                add_transition(&mut transitions, prefix, next);
            }

            accepted.push(words.join(" "));
        }

        MarkovModel {
            n,
            transitions,
            lines: accepted.len(),
            rejoined: accepted.join("\n"),
        }
    }
}

fn accepts_input(line: &str) -> bool {
    !line.contains(SENTENCE_START)
        && !line.contains(SENTENCE_END)
        && !rejected_input().is_match(line)
}

/// Add a transition to a transition table, incrementing the count.
fn add_transition(
    table: &mut FxHashMap<Vec<String>, Vec<(String, u32)>>,
    prefix: Vec<String>,
    next: String,
) {
    let entries = table.entry(prefix).or_default();
    if let Some(entry) = entries.iter_mut().find(|(tok, _)| tok == &next) {
        entry.1 += 1;
    } else {
        entries.push((next, 1));
    }
}
