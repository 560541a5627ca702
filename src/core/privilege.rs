/// Operator privilege checks for the toggle command.
use rustc_hash::{FxHashMap, FxHashSet};

/// Channel user modes that count as operator: owner, admin, op, half-op.
pub const OPERATOR_MODES: &[char] = &['~', '&', '@', '%'];

/// Decides whether a sender may change settings in a scope.
pub trait PrivilegeCheck {
    fn is_operator(&self, scope: &str, nick: &str) -> bool;
}

impl<F> PrivilegeCheck for F
where
    F: Fn(&str, &str) -> bool,
{
    fn is_operator(&self, scope: &str, nick: &str) -> bool {
        self(scope, nick)
    }
}

/// Per-channel user mode lists, as tracked from NAMES and MODE messages.
#[derive(Debug, Clone, Default)]
pub struct ChannelModes {
    channels: FxHashMap<String, FxHashMap<char, FxHashSet<String>>>,
}

impl ChannelModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, channel: &str, mode: char, nick: &str) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .entry(mode)
            .or_default()
            .insert(nick.to_string());
    }

    pub fn revoke(&mut self, channel: &str, mode: char, nick: &str) {
        if let Some(nicks) = self
            .channels
            .get_mut(channel)
            .and_then(|modes| modes.get_mut(&mode))
        {
            nicks.remove(nick);
        }
    }

    /// Nicks holding `mode` in `channel`, if the channel or mode is known.
    pub fn holders(&self, channel: &str, mode: char) -> Option<&FxHashSet<String>> {
        self.channels.get(channel)?.get(&mode)
    }
}

impl PrivilegeCheck for ChannelModes {
    fn is_operator(&self, scope: &str, nick: &str) -> bool {
        OPERATOR_MODES.iter().any(|mode| {
            self.holders(scope, *mode)
                .map_or(false, |nicks| nicks.contains(nick))
        })
    }
}
