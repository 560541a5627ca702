/// Formatting — strips mIRC-style control codes from chat text.
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

fn control_codes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // bold, italic, underline, reset, reverse, monospace, strikethrough,
        // and colour with optional fg[,bg]
        Regex::new(r"[\x02\x0f\x11\x16\x1d\x1e\x1f]|\x03(?:\d{1,2}(?:,\d{1,2})?)?")
            .expect("control code pattern is valid")
    })
}

/// Remove presentation markup, borrowing when there is nothing to strip.
pub fn strip_formatting(text: &str) -> Cow<'_, str> {
    control_codes().replace_all(text, "")
}
