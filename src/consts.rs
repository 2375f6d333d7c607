//! Shared constants for the dashboard crate.

// ── Dispatch ────────────────────────────────────────────────────

/// Debounce window in milliseconds between a raw input and callback delivery.
pub const DEBOUNCE_MS: i64 = 7;

// ── Layout ──────────────────────────────────────────────────────

/// First tab index handed out when the panel options don't override it.
pub const TAB_INDEX_START: i32 = 1;

/// Separator placed between the panel id prefix and a control id.
pub const PREFIX_SEPARATOR: char = '_';

/// Suffix appended to a slider id to form its readout id.
pub const READOUT_SUFFIX: &str = "v";

/// Prefix for synthesized radio-group names.
pub const RADIO_GROUP_PREFIX: &str = "radiogrp_";

// ── CSS classes ─────────────────────────────────────────────────

/// Class of the panel container.
pub const PANEL_CLASS: &str = "dashboard";

/// Class of a control's wrapping line.
pub const LINE_CLASS: &str = "line";

/// Class of an expanded group container.
pub const GROUP_CLASS: &str = "group";

/// Class of a collapsed group container.
pub const HIDDEN_CLASS: &str = "hidden";

/// Class of a radio-group caption and of each option wrapper.
pub const RADIO_CLASS: &str = "radio";

// ── Defaults ────────────────────────────────────────────────────

/// Upper bound of a numeric slider when none is given.
pub const SLIDER_MAX: f64 = 100.0;

/// Initial value of a color control when none is given.
pub const DEFAULT_COLOR: &str = "#ff0000";

/// Link text when none is given.
pub const DEFAULT_LINK_TEXT: &str = "link";
