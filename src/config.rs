//! Panel construction options.
//!
//! Options come from code or JSON (`PanelOptions` is `Deserialize`); the
//! debounce tuning can additionally be overridden from the environment with
//! [`PanelOptions::from_env`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Deserialize;

use crate::consts::{DEBOUNCE_MS, PANEL_CLASS, TAB_INDEX_START};
use crate::dispatch::DebounceScope;

/// Construction options for a [`crate::panel::Panel`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PanelOptions {
    /// Dom id of the panel container.
    pub id: Option<String>,
    /// Prefix joined with `_` in front of every control id.
    pub id_prefix: Option<String>,
    /// Class of the panel container.
    pub css: String,
    /// First tab index handed to focusable controls.
    pub tab_index_start: i32,
    /// Debounce window in milliseconds.
    pub debounce_ms: i64,
    /// Coalescing scope of the debounce window.
    pub debounce_scope: DebounceScope,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            id: None,
            id_prefix: None,
            css: PANEL_CLASS.to_owned(),
            tab_index_start: TAB_INDEX_START,
            debounce_ms: DEBOUNCE_MS,
            debounce_scope: DebounceScope::default(),
        }
    }
}

impl PanelOptions {
    /// Defaults overlaid with `DASHBOARD_DEBOUNCE_MS` and `DASHBOARD_DEBOUNCE_SCOPE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Overlay the environment overrides onto `self`.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.debounce_ms = env_parse("DASHBOARD_DEBOUNCE_MS", self.debounce_ms).max(0);
        self.debounce_scope = match std::env::var("DASHBOARD_DEBOUNCE_SCOPE").as_deref() {
            Ok("panel") => DebounceScope::Panel,
            Ok("control") => DebounceScope::Control,
            _ => self.debounce_scope,
        };
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: DebounceScope) -> Self {
        self.debounce_scope = scope;
        self
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
