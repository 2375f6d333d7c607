//! Identity and layout service: id prefixing, synthesized ids, tab order.
//!
//! Every descriptor consumes one ordinal, whether or not it carries an
//! explicit id. Synthesized ids are `kind + ordinal`; when that collides with
//! a live or previously removed id the ordinal keeps counting, so ids are
//! never recycled.

#[cfg(test)]
#[path = "ident_test.rs"]
mod ident_test;

use std::collections::HashSet;

use crate::consts::{PREFIX_SEPARATOR, RADIO_GROUP_PREFIX};
use crate::descriptor::ControlKind;
use crate::error::PanelError;

/// A control id in both its panel-scoped and caller-facing forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    /// Prefixed id, unique within the panel.
    pub full: String,
    /// Id as the caller knows it.
    pub short: String,
    /// Ordinal consumed by this descriptor.
    pub ordinal: u64,
}

/// Per-panel id and tab-order allocator.
#[derive(Debug)]
pub struct IdAllocator {
    prefix: String,
    count: u64,
    tab_index: i32,
    live: HashSet<String>,
    retired: HashSet<String>,
}

impl IdAllocator {
    #[must_use]
    pub fn new(prefix: Option<&str>, tab_index_start: i32) -> Self {
        let prefix = prefix.map_or_else(String::new, |p| format!("{p}{PREFIX_SEPARATOR}"));
        Self { prefix, count: 0, tab_index: tab_index_start, live: HashSet::new(), retired: HashSet::new() }
    }

    /// Prefix a caller-facing id.
    #[must_use]
    pub fn full(&self, short: &str) -> String {
        format!("{}{short}", self.prefix)
    }

    /// Strip the panel prefix from a resolved id.
    #[must_use]
    pub fn short<'a>(&self, full: &'a str) -> &'a str {
        full.strip_prefix(self.prefix.as_str()).unwrap_or(full)
    }

    /// Consume an ordinal and reserve an id for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::DuplicateControl`] when `explicit` names a live control.
    pub fn resolve(&mut self, explicit: Option<&str>, kind: ControlKind) -> Result<ResolvedId, PanelError> {
        self.count += 1;
        let ordinal = self.count;

        if let Some(short) = explicit {
            let full = self.full(short);
            if self.live.contains(&full) {
                return Err(PanelError::DuplicateControl(short.to_owned()));
            }
            self.retired.remove(&full);
            self.live.insert(full.clone());
            return Ok(ResolvedId { full, short: short.to_owned(), ordinal });
        }

        let mut n = ordinal;
        loop {
            let short = format!("{}{n}", kind.as_str());
            let full = self.full(&short);
            if !self.live.contains(&full) && !self.retired.contains(&full) {
                self.live.insert(full.clone());
                return Ok(ResolvedId { full, short, ordinal });
            }
            n += 1;
        }
    }

    /// Whether `full` is reserved by a live control.
    #[must_use]
    pub fn is_live(&self, full: &str) -> bool {
        self.live.contains(full)
    }

    /// Release a removed control's id; synthesized ids never hand it out again.
    pub fn retire(&mut self, full: &str) {
        if self.live.remove(full) {
            self.retired.insert(full.to_owned());
        }
    }

    /// Next keyboard tab index.
    pub fn next_tab_index(&mut self) -> i32 {
        let index = self.tab_index;
        self.tab_index += 1;
        index
    }

    /// Default caption: kind plus ordinal.
    #[must_use]
    pub fn default_label(kind: ControlKind, ordinal: u64) -> String {
        format!("{}{ordinal}", kind.as_str())
    }

    /// Default radio name for a radio-group.
    #[must_use]
    pub fn radio_group_name(ordinal: u64) -> String {
        format!("{RADIO_GROUP_PREFIX}{ordinal}")
    }

    /// Dom id of the `index`-th option of a radio-group.
    #[must_use]
    pub fn radio_option_id(full: &str, index: usize) -> String {
        format!("{full}{PREFIX_SEPARATOR}{index}")
    }
}
