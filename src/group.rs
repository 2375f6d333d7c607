//! Group state machine: `Expanded` ⇄ `Collapsed`.
//!
//! Pointer activation and the Enter/Space keys toggle; ArrowLeft forces
//! `Collapsed` and ArrowRight forces `Expanded` without toggling. A
//! programmatic set forces the requested state the same way.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use crate::consts::HIDDEN_CLASS;
use crate::input::Key;

/// Collapse state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupState {
    #[default]
    Expanded,
    Collapsed,
}

impl GroupState {
    #[must_use]
    pub fn from_collapsed(collapsed: bool) -> Self {
        if collapsed { Self::Collapsed } else { Self::Expanded }
    }

    /// The state a programmatic `value(id, expanded)` lands in.
    #[must_use]
    pub fn forced(expanded: bool) -> Self {
        Self::from_collapsed(!expanded)
    }

    /// Logical value of the group.
    #[must_use]
    pub fn is_expanded(self) -> bool {
        self == Self::Expanded
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }

    /// Next state for a key pressed on the header; `None` for unrelated keys.
    #[must_use]
    pub fn on_key(self, key: &Key) -> Option<Self> {
        match key {
            Key::ArrowLeft => Some(Self::Collapsed),
            Key::ArrowRight => Some(Self::Expanded),
            Key::Enter | Key::Space => Some(self.toggled()),
            Key::Other(_) => None,
        }
    }

    /// Container class for this state.
    #[must_use]
    pub fn class(self, expanded_css: &str) -> &str {
        match self {
            Self::Expanded => expanded_css,
            Self::Collapsed => HIDDEN_CLASS,
        }
    }
}
