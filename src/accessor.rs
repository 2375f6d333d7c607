//! Value accessor protocol: uniform get/set over every control kind.
//!
//! | Kind | Logical value |
//! |------|---------------|
//! | slider | number (clamped, snapped to step) |
//! | checkbox | bool |
//! | textbox, color | text of the input |
//! | dropdown, radio-group | selected index, `-1` when none |
//! | button, info | caption text |
//! | image | source URL |
//! | group | `true` when expanded |
//! | custom | whatever the `on_get` hook reports |
//! | separator, static-text, link | none |
//!
//! Setting is forgiving: a value that can't apply (an index out of range, a
//! label or radio value with no match, text where a number is needed) leaves
//! the control untouched.

#[cfg(test)]
#[path = "accessor_test.rs"]
mod accessor_test;

use crate::control::{Backing, ControlInstance, RadioState, SliderState};
use crate::error::HostError;
use crate::group::GroupState;
use crate::host::{HostTree, NodeId};
use crate::value::{Value, format_number};

/// Read the logical value of `ctl`. `None` for kinds without one.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if one of the control's nodes is gone.
#[allow(clippy::cast_precision_loss)]
pub fn get(host: &HostTree, ctl: &ControlInstance) -> Result<Option<Value>, HostError> {
    let node = host.node(ctl.node)?;
    let value = match &ctl.backing {
        Backing::Slider(slider) => {
            let raw = Value::Text(node.value.clone()).as_number().unwrap_or(slider.min);
            Value::Number(raw)
        }
        Backing::Checkbox => Value::Bool(node.checked),
        Backing::Textbox { .. } | Backing::Color => Value::Text(node.value.clone()),
        Backing::Dropdown => Value::Number(node.selected.map_or(-1.0, |i| i as f64)),
        Backing::RadioGroup(radio) => Value::Number(checked_index(host, radio)?.map_or(-1.0, |i| i as f64)),
        Backing::Button | Backing::Info => Value::Text(node.text.clone()),
        Backing::Image => Value::Text(node.attr("src").unwrap_or_default().to_owned()),
        Backing::Group(group) => Value::Bool(group.state.is_expanded()),
        Backing::Custom(hooks) => {
            return Ok(hooks.on_get.as_ref().and_then(|hook| hook(host, ctl.node)));
        }
        Backing::Separator | Backing::StaticText | Backing::Link => return Ok(None),
    };
    Ok(Some(value))
}

/// Write `value` into `ctl`. Returns whether the value was applied; a
/// rejected value (see the module docs) leaves the control untouched and
/// reports `false`.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if one of the control's nodes is gone.
pub fn set(host: &mut HostTree, ctl: &mut ControlInstance, value: &Value) -> Result<bool, HostError> {
    let node_id = ctl.node;
    let line = ctl.line;
    match &mut ctl.backing {
        Backing::Slider(slider) => {
            let Some(n) = value.as_number() else {
                return Ok(false);
            };
            host.node_mut(node_id)?.value = format_number(slider.sanitize(n));
            refresh_readout(host, slider, node_id)?;
        }
        Backing::Checkbox => host.node_mut(node_id)?.checked = value.truthy(),
        Backing::Textbox { .. } | Backing::Color => host.node_mut(node_id)?.value = value.to_text(),
        Backing::Dropdown => return select_option(host, node_id, value),
        Backing::RadioGroup(radio) => {
            return match value {
                Value::Text(wanted) => check_by_value(host, radio, wanted),
                other => match other.as_index().and_then(|i| radio.members.get(i)) {
                    Some(member) => {
                        host.check_radio(*member)?;
                        Ok(true)
                    }
                    None => Ok(false),
                },
            };
        }
        Backing::Button | Backing::Info => host.node_mut(node_id)?.text = value.to_text(),
        Backing::Image => host.node_mut(node_id)?.set_attr("src", value.to_text()),
        Backing::Group(group) => {
            group.state = GroupState::forced(value.truthy());
            host.node_mut(line)?.class = Some(group.state.class(&group.css).to_owned());
        }
        Backing::Custom(hooks) => {
            let Some(hook) = hooks.on_set.as_mut() else {
                return Ok(false);
            };
            hook(host, node_id, value);
        }
        Backing::Separator | Backing::StaticText | Backing::Link => return Ok(false),
    }
    Ok(true)
}

/// Move a group to `state` and restyle its container.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if the group's line is gone.
pub fn set_group_state(host: &mut HostTree, ctl: &mut ControlInstance, state: GroupState) -> Result<(), HostError> {
    let line = ctl.line;
    if let Backing::Group(group) = &mut ctl.backing {
        group.state = state;
        host.node_mut(line)?.class = Some(state.class(&group.css).to_owned());
    }
    Ok(())
}

/// Normalize a slider's raw position and redraw its readout.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if the slider or readout node is gone.
pub fn refresh_readout(host: &mut HostTree, slider: &SliderState, node: NodeId) -> Result<(), HostError> {
    let input = host.node_mut(node)?;
    let raw = Value::Text(input.value.clone()).as_number().unwrap_or(slider.min);
    let value = slider.sanitize(raw);
    input.value = format_number(value);
    host.node_mut(slider.readout)?.text = slider.display(value);
    Ok(())
}

/// Index of the checked option, if any.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if an option node is gone.
pub fn checked_index(host: &HostTree, radio: &RadioState) -> Result<Option<usize>, HostError> {
    for (i, member) in radio.members.iter().enumerate() {
        if host.node(*member)?.checked {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Underlying value string of the checked option, if any.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if an option node is gone.
pub fn checked_value(host: &HostTree, radio: &RadioState) -> Result<Option<String>, HostError> {
    Ok(match checked_index(host, radio)? {
        Some(i) => Some(host.node(radio.members[i])?.value.clone()),
        None => None,
    })
}

/// Check the first option whose value equals `wanted`. Returns whether one matched.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if an option node is gone.
pub fn check_by_value(host: &mut HostTree, radio: &RadioState, wanted: &str) -> Result<bool, HostError> {
    for member in &radio.members {
        if host.node(*member)?.value == wanted {
            host.check_radio(*member)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Select by index or by exact option text; first match wins.
fn select_option(host: &mut HostTree, select: NodeId, value: &Value) -> Result<bool, HostError> {
    let options = host.node(select)?.children().to_vec();
    let index = match value {
        Value::Text(label) => {
            let mut found = None;
            for (i, option) in options.iter().enumerate() {
                if host.node(*option)?.text == *label {
                    found = Some(i);
                    break;
                }
            }
            found
        }
        other => other.as_index().filter(|i| *i < options.len()),
    };
    let Some(index) = index else {
        return Ok(false);
    };
    host.node_mut(select)?.selected = Some(index);
    Ok(true)
}
