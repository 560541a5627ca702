/// Response generator — turns a sampled corpus into a short reply.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::core::markov::{MarkovError, MarkovTrainer, SentenceOptions};

/// Default upper bound on generated reply length, in characters.
pub const MAX_REPLY_LENGTH: usize = 180;

/// N-gram depth used for replies: two words of context.
const NGRAM_DEPTH: usize = 3;

/// Filler sent when the model has nothing usable to say.
pub const FALLBACK_REPLIES: &[&str] = &["What?", "Hmm?", "Yes?", "What do you want?"];

/// Build a fresh model from `corpus` and try for one sentence of at most
/// `max_length` characters. `None` means no candidate qualified.
pub fn generate(corpus: &[String], max_length: usize, rng: &mut StdRng) -> Option<String> {
    let model = MarkovTrainer::train_lines(corpus, NGRAM_DEPTH);
    log::debug!(
        "[responder] Built model from {}/{} lines",
        model.line_count(),
        corpus.len()
    );

    match model.make_short_sentence(rng, max_length, &SentenceOptions::default()) {
        Ok(sentence) => Some(sentence),
        Err(MarkovError::NoData) => {
            log::debug!("[responder] Corpus too small or degenerate for a model");
            None
        }
        Err(e) => {
            log::debug!("[responder] {}", e);
            None
        }
    }
}

/// One of [`FALLBACK_REPLIES`], chosen uniformly.
pub fn fallback_reply(rng: &mut StdRng) -> &'static str {
    FALLBACK_REPLIES.choose(rng).copied().unwrap_or("Hmm?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_corpus_gives_no_reply() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&[], MAX_REPLY_LENGTH, &mut rng).is_none());
    }

    #[test]
    fn single_line_corpus_gives_no_reply() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&lines(&["a b c"]), MAX_REPLY_LENGTH, &mut rng).is_none());
    }

    #[test]
    fn replies_respect_length_bound() {
        let corpus = lines(&[
            "we are going to the beach tomorrow",
            "they are going to the party tonight",
            "i am going to the shop later",
            "you are going to love the new release",
        ]);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Some(reply) = generate(&corpus, 40, &mut rng) {
                assert!(reply.chars().count() <= 40, "too long: {}", reply);
            }
        }
    }

    #[test]
    fn fallback_comes_from_fixed_set() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(FALLBACK_REPLIES.contains(&fallback_reply(&mut rng)));
        }
    }
}
