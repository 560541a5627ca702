/// Message filter — decides which chat lines are noise.
///
/// Noise lines never enter the corpus and never trigger a reply.
use regex::Regex;
use std::sync::OnceLock;

/// CTCP marker the client prepends to `/me` actions.
const ACTION_MARKER: &str = "\x01ACTION ";

/// A leading run of bot command triggers, e.g. `!help` or `..seen`.
fn command_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[.!~`$]+").expect("command prefix pattern is valid"))
}

/// `s/foo/bar/g` style corrections people send after a typo.
fn sed_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^s/(.*/.*(?:/[igx]{0,4})?)\S*$").expect("sed pattern is valid")
    })
}

/// Returns true when `line` should be excluded from the corpus.
///
/// Total over all inputs: empty or whitespace-only lines, bot commands,
/// find/replace directives, `[status]` lines and CTCP actions are noise.
pub fn should_ignore(line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }

    command_prefix().is_match(line)
        || sed_directive().is_match(line)
        || line.starts_with('[')
        || line.starts_with(ACTION_MARKER)
}
