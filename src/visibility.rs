//! Visibility and enablement controller.
//!
//! Enablement lands on the primitive that receives input: every option of a
//! radio-group, the header of a group, the custom control's `on_enable` hook.
//! Visibility always lands on the wrapping line so the label moves with the
//! control. Collapsing a group on disable is the panel's job, since it runs
//! through the dispatch pipeline.

#[cfg(test)]
#[path = "visibility_test.rs"]
mod visibility_test;

use crate::control::{Backing, ControlInstance};
use crate::error::HostError;
use crate::host::{HostTree, NodeId};

/// Enable or disable `ctl`.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if a target node is gone.
pub fn enable(host: &mut HostTree, ctl: &mut ControlInstance, state: bool) -> Result<(), HostError> {
    let node = ctl.node;
    match &mut ctl.backing {
        Backing::RadioGroup(radio) => {
            for member in &radio.members {
                host.node_mut(*member)?.disabled = !state;
            }
        }
        Backing::Custom(hooks) => {
            if let Some(hook) = hooks.on_enable.as_mut() {
                hook(host, node, state);
            }
        }
        Backing::Slider(_)
        | Backing::Checkbox
        | Backing::Textbox { .. }
        | Backing::Color
        | Backing::Dropdown
        | Backing::Button
        | Backing::Separator
        | Backing::Info
        | Backing::StaticText
        | Backing::Link
        | Backing::Image
        | Backing::Group(_) => host.node_mut(node)?.disabled = !state,
    }
    ctl.enabled = state;
    Ok(())
}

/// Show or hide the line wrapping `ctl`.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if the line is gone.
pub fn show(host: &mut HostTree, ctl: &mut ControlInstance, state: bool) -> Result<(), HostError> {
    host.node_mut(ctl.line)?.hidden = !state;
    ctl.visible = state;
    Ok(())
}

/// Show or hide a whole panel container.
///
/// # Errors
///
/// Returns [`HostError::UnknownNode`] if the container is gone.
pub fn show_container(host: &mut HostTree, container: NodeId, state: bool) -> Result<(), HostError> {
    host.node_mut(container)?.hidden = !state;
    Ok(())
}
