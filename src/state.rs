//! Parse context tracking.
//!
//! Contexts are not mutually exclusive: a table row can sit inside a step
//! inside a scenario. `ParseState` is a bit-set of the active contexts and
//! the four operations below are its only mutation surface.

use std::fmt;
use std::ops::BitOr;

/// Set of currently active parse contexts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParseState(u16);

impl ParseState {
    pub const INITIAL: Self = Self(0);
    pub const SPEC: Self = Self(1);
    pub const SCENARIO: Self = Self(1 << 1);
    pub const COMMENT: Self = Self(1 << 2);
    pub const TABLE: Self = Self(1 << 3);
    pub const TABLE_SEPARATOR: Self = Self(1 << 4);
    pub const TAGS: Self = Self(1 << 5);
    pub const STEP: Self = Self(1 << 6);
    pub const CONTEXT: Self = Self(1 << 7);
    pub const TEAR_DOWN: Self = Self(1 << 8);
    pub const KEYWORD: Self = Self(1 << 9);
    pub const NEW_LINE: Self = Self(1 << 10);

    const NAMES: [(Self, &'static str); 11] = [
        (Self::SPEC, "spec"),
        (Self::SCENARIO, "scenario"),
        (Self::COMMENT, "comment"),
        (Self::TABLE, "table"),
        (Self::TABLE_SEPARATOR, "table_separator"),
        (Self::TAGS, "tags"),
        (Self::STEP, "step"),
        (Self::CONTEXT, "context"),
        (Self::TEAR_DOWN, "tear_down"),
        (Self::KEYWORD, "keyword"),
        (Self::NEW_LINE, "new_line"),
    ];

    fn mask(states: &[Self]) -> u16 {
        states.iter().fold(0, |mask, state| mask | state.0)
    }

    /// True if at least one of `states` is active.
    #[must_use]
    pub fn is_in(self, states: &[Self]) -> bool {
        Self::mask(states) & self.0 != 0
    }

    /// Same answer as [`is_in`](Self::is_in), checking each candidate in
    /// turn.
    #[must_use]
    pub fn is_in_any(self, states: &[Self]) -> bool {
        states.iter().any(|state| self.0 & state.0 != 0)
    }

    /// Drop every active context that is not in `keep`.
    pub fn retain(&mut self, keep: &[Self]) {
        self.0 &= Self::mask(keep);
    }

    /// Activate every context in `states`.
    pub fn add(&mut self, states: &[Self]) {
        self.0 |= Self::mask(states);
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ParseState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ParseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_initial() {
            return write!(f, "ParseState(initial)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(state, _)| self.contains(*state))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "ParseState({})", names.join(" | "))
    }
}
