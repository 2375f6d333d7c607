//! Binding between tagged controls and a flat JSON model.
//!
//! The binding map is not stored: it is derived by walking live controls in
//! document order and reading their `bind` key. When two controls share a
//! key, the later one wins in [`Panel::get_bound`].
//!
//! Radio-groups are matched and reported by option value, not index, so a
//! model round-trips through them by value.

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use crate::accessor;
use crate::control::Backing;
use crate::error::PanelError;
use crate::panel::Panel;
use crate::value::Value;

impl Panel {
    /// Push model values into every bound control whose key is present.
    /// Missing keys and unmatched radio values are skipped.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the accessors.
    pub fn bind_to(&mut self, model: &Map<String, JsonValue>) -> Result<(), PanelError> {
        let mut applied = 0usize;
        for id in self.document_order() {
            let Some(ctl) = self.controls.get(&id) else {
                continue;
            };
            let Some(raw) = ctl.bind.as_deref().and_then(|key| model.get(key)) else {
                continue;
            };
            let node = ctl.node;
            let radio = match &ctl.backing {
                Backing::RadioGroup(radio) => Some(radio.clone()),
                _ => None,
            };

            if let Some(radio) = radio {
                let wanted = match raw {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if accessor::check_by_value(self.host_mut(), &radio, &wanted)? {
                    self.notify_changed(node)?;
                    applied += 1;
                } else {
                    trace!(%node, value = %wanted, "binding: no radio option matches");
                }
                continue;
            }

            let Some(value) = Value::from_json(raw) else {
                trace!(%node, "binding: value not representable");
                continue;
            };
            self.set_value(node, value)?;
            applied += 1;
        }
        debug!(panel = %self.instance_id(), applied, "binding: model applied");
        Ok(())
    }

    /// Parse `text` as a JSON object and apply it with [`Panel::bind_to`].
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::InvalidModel`] when `text` is not a JSON object.
    pub fn bind_to_json(&mut self, text: &str) -> Result<(), PanelError> {
        match serde_json::from_str::<JsonValue>(text) {
            Ok(JsonValue::Object(model)) => self.bind_to(&model),
            Ok(other) => Err(PanelError::InvalidModel(format!("expected an object, got {other}"))),
            Err(e) => Err(PanelError::InvalidModel(e.to_string())),
        }
    }

    /// Collect the current value of every bound control under its key.
    /// Radio-groups contribute the checked option's value and are absent when
    /// nothing is checked.
    ///
    /// # Errors
    ///
    /// Propagates host failures from the accessors.
    pub fn get_bound(&self) -> Result<Map<String, JsonValue>, PanelError> {
        let mut model = Map::new();
        for id in self.document_order() {
            let Some(ctl) = self.controls.get(&id) else {
                continue;
            };
            let Some(key) = ctl.bind.as_deref() else {
                continue;
            };
            let value = match &ctl.backing {
                Backing::RadioGroup(radio) => accessor::checked_value(self.host(), radio)?.map(JsonValue::String),
                _ => accessor::get(self.host(), ctl)?.map(|v| v.to_json()),
            };
            if let Some(value) = value {
                model.insert(key.to_owned(), value);
            }
        }
        Ok(model)
    }
}
