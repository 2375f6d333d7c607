//! Control factory: descriptor in, detached widget subtree out.
//!
//! DESIGN
//! ======
//! `build` dispatches on the descriptor's kind and returns a [`Built`] tree:
//! the new instance (its line not yet mounted) plus, for groups, the built
//! children already mounted inside the group container. The caller mounts the
//! line and registers the instances. Only the host tree and the id allocator
//! are touched here; the factory knows nothing about the registry.
//!
//! ERROR HANDLING
//! ==============
//! If a group child fails, everything built for the group so far is detached
//! and its ids retired before the error is returned.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use tracing::warn;

use crate::consts::{DEFAULT_COLOR, DEFAULT_LINK_TEXT, GROUP_CLASS, LINE_CLASS, RADIO_CLASS, READOUT_SUFFIX};
use crate::control::{Backing, ControlInstance, GroupBacking, RadioState, SliderState};
use crate::descriptor::{
    ControlSpec, CustomSpec, Descriptor, DropdownSpec, GroupSpec, RadioSpec, SliderSpec, StaticTextSpec,
};
use crate::dispatch::Callback;
use crate::error::PanelError;
use crate::group::GroupState;
use crate::host::{HostTree, InputType, NodeId, Tag};
use crate::ident::{IdAllocator, ResolvedId};
use crate::value::format_number;

/// A freshly built instance and, for groups, its built children.
#[derive(Debug)]
pub(crate) struct Built {
    pub instance: ControlInstance,
    pub children: Vec<Built>,
}

impl Built {
    /// Every resolved id in this subtree, parent first.
    pub fn ids(&self) -> Vec<String> {
        let mut out = vec![self.instance.id.clone()];
        for child in &self.children {
            out.extend(child.ids());
        }
        out
    }
}

/// Attributes every kind shares, resolved from the descriptor.
struct Common {
    id: ResolvedId,
    label: String,
    css: Option<String>,
    show: bool,
    enabled: bool,
}

/// What a per-kind builder hands back.
struct Parts {
    line: NodeId,
    node: NodeId,
    backing: Backing,
    children: Vec<Built>,
}

impl Parts {
    fn simple(line: NodeId, node: NodeId, backing: Backing) -> Self {
        Self { line, node, backing, children: Vec::new() }
    }
}

pub(crate) struct Factory<'a> {
    pub host: &'a mut HostTree,
    pub ids: &'a mut IdAllocator,
    pub default_callback: Option<&'a Callback>,
}

impl Factory<'_> {
    /// Build `desc` into a detached line.
    ///
    /// # Errors
    ///
    /// [`PanelError::DuplicateControl`] for a live explicit id and
    /// [`PanelError::Host`] when a custom control's node can't be mounted.
    pub fn build(&mut self, desc: Descriptor, parent_group: Option<&str>) -> Result<Built, PanelError> {
        let kind = desc.kind();
        let id = self.ids.resolve(desc.id.as_deref(), kind)?;
        let label = desc
            .label
            .unwrap_or_else(|| IdAllocator::default_label(kind, id.ordinal));
        let common = Common {
            label,
            css: desc.css,
            show: desc.show.unwrap_or(true),
            enabled: desc.enabled.unwrap_or(true),
            id,
        };
        let callback = desc.callback.or_else(|| self.default_callback.cloned());

        let parts = match desc.spec {
            ControlSpec::Slider(spec) => self.slider(&common, spec),
            ControlSpec::Checkbox(spec) => {
                let (line, node) = self.labelled_input(&common, InputType::Checkbox)?;
                self.host.node_mut(node)?.checked = spec.checked;
                Ok(Parts::simple(line, node, Backing::Checkbox))
            }
            ControlSpec::Textbox(spec) => {
                let (line, node) = self.labelled_input(&common, InputType::Text)?;
                let input = self.host.node_mut(node)?;
                input.value = spec.text;
                if let Some(placeholder) = spec.placeholder {
                    input.set_attr("placeholder", placeholder);
                }
                Ok(Parts::simple(line, node, Backing::Textbox { live: spec.live }))
            }
            ControlSpec::Color(spec) => {
                let (line, node) = self.labelled_input(&common, InputType::Color)?;
                self.host.node_mut(node)?.value = spec.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned());
                Ok(Parts::simple(line, node, Backing::Color))
            }
            ControlSpec::Dropdown(spec) => self.dropdown(&common, spec),
            ControlSpec::RadioGroup(spec) => self.radio(&common, spec),
            ControlSpec::Button(spec) => {
                let text = spec
                    .text
                    .unwrap_or_else(|| IdAllocator::default_label(kind, common.id.ordinal));
                let (line, node) = self.labelled(&common, Tag::Button, true, text)?;
                Ok(Parts::simple(line, node, Backing::Button))
            }
            ControlSpec::Separator(_) => {
                let node = self.host.create(Tag::Rule);
                let rule = self.host.node_mut(node)?;
                rule.dom_id = Some(common.id.full.clone());
                rule.hidden = !common.show;
                Ok(Parts::simple(node, node, Backing::Separator))
            }
            ControlSpec::Info(spec) => {
                let (line, node) = self.labelled(&common, Tag::Italic, false, spec.text)?;
                Ok(Parts::simple(line, node, Backing::Info))
            }
            ControlSpec::StaticText(spec) => self.static_text(&common, spec),
            ControlSpec::Link(spec) => {
                let line = self.line(&common);
                let node = self.host.create(Tag::Anchor);
                let anchor = self.host.node_mut(node)?;
                anchor.dom_id = Some(common.id.full.clone());
                anchor.text = spec.text.unwrap_or_else(|| DEFAULT_LINK_TEXT.to_owned());
                anchor.set_attr("href", spec.value);
                self.host.append(line, node)?;
                Ok(Parts::simple(line, node, Backing::Link))
            }
            ControlSpec::Image(spec) => {
                let line = self.line(&common);
                let node = self.host.create(Tag::Image);
                let image = self.host.node_mut(node)?;
                image.dom_id = Some(common.id.full.clone());
                image.set_attr("src", spec.value);
                self.host.append(line, node)?;
                Ok(Parts::simple(line, node, Backing::Image))
            }
            ControlSpec::Group(spec) => self.group(&common, spec),
            ControlSpec::Custom(spec) => self.custom(&common, spec),
        };

        let parts = match parts {
            Ok(parts) => parts,
            Err(e) => {
                self.ids.retire(&common.id.full);
                return Err(e);
            }
        };

        // Groups and customs sync their own disabled state.
        if !common.enabled && !matches!(parts.backing, Backing::Group(_) | Backing::Custom(_)) {
            for node in disabled_targets(&parts) {
                self.host.node_mut(node)?.disabled = true;
            }
        }

        Ok(Built {
            instance: ControlInstance {
                id: common.id.full,
                short_id: common.id.short,
                line: parts.line,
                node: parts.node,
                enabled: common.enabled,
                visible: common.show,
                bind: desc.bind,
                callback,
                last_emitted: None,
                parent: parent_group.map(str::to_owned),
                backing: parts.backing,
            },
            children: parts.children,
        })
    }

    /// Detach a built subtree that will never be registered and retire its ids.
    pub fn discard(&mut self, built: Built) {
        for id in built.ids() {
            self.ids.retire(&id);
        }
        if let Err(e) = self.host.detach(built.instance.line) {
            warn!(error = %e, id = %built.instance.id, "factory: discard found no line");
        }
    }

    // =========================================================================
    // PER-KIND BUILDERS
    // =========================================================================

    fn slider(&mut self, common: &Common, spec: SliderSpec) -> Result<Parts, PanelError> {
        let (line, node) = self.labelled_input(common, InputType::Range)?;
        let readout = self.host.create(Tag::Span);

        let (state, initial) = match spec.items {
            Some(items) => {
                #[allow(clippy::cast_precision_loss)]
                let max = items.len().saturating_sub(1) as f64;
                let state = SliderState { min: 0.0, max, step: 1.0, live: spec.live, readout, items: Some(items), formatter: None };
                (state, 0.0)
            }
            None => {
                let step = if spec.step > 0.0 { spec.step } else { 1.0 };
                let state = SliderState {
                    min: spec.min,
                    max: spec.max,
                    step,
                    live: spec.live,
                    readout,
                    items: None,
                    formatter: spec.formatter,
                };
                (state, spec.value)
            }
        };
        let value = state.sanitize(initial);

        self.host.node_mut(node)?.value = format_number(value);
        let span = self.host.node_mut(readout)?;
        span.dom_id = Some(format!("{}{READOUT_SUFFIX}", common.id.full));
        span.text = state.display(value);
        self.host.append(line, readout)?;

        Ok(Parts::simple(line, node, Backing::Slider(state)))
    }

    fn dropdown(&mut self, common: &Common, spec: DropdownSpec) -> Result<Parts, PanelError> {
        let (line, node) = self.labelled(common, Tag::Select, true, String::new())?;
        for item in &spec.items {
            let option = self.host.create(Tag::Option);
            self.host.node_mut(option)?.text.clone_from(item);
            self.host.append(node, option)?;
        }
        let selected = if spec.value < spec.items.len() {
            Some(spec.value)
        } else if spec.items.is_empty() {
            None
        } else {
            Some(0)
        };
        self.host.node_mut(node)?.selected = selected;
        Ok(Parts::simple(line, node, Backing::Dropdown))
    }

    fn radio(&mut self, common: &Common, spec: RadioSpec) -> Result<Parts, PanelError> {
        let line = self.line(common);
        let name = spec
            .group
            .unwrap_or_else(|| IdAllocator::radio_group_name(common.id.ordinal));

        let caption = self.host.create(Tag::Div);
        let caption_text = self.host.create(Tag::Paragraph);
        self.host.node_mut(caption_text)?.text.clone_from(&common.label);
        let node = self.host.node_mut(caption)?;
        node.dom_id = Some(common.id.full.clone());
        node.class = Some(RADIO_CLASS.to_owned());
        self.host.append(caption, caption_text)?;
        self.host.append(line, caption)?;

        let checked = usize::try_from(spec.value).ok();
        let mut members = Vec::with_capacity(spec.items.len());
        for (i, item) in spec.items.into_iter().enumerate() {
            let option_id = IdAllocator::radio_option_id(&common.id.full, i);
            let wrapper = self.host.create(Tag::Div);
            self.host.node_mut(wrapper)?.class = Some(RADIO_CLASS.to_owned());

            let radio = self.host.create(Tag::Input(InputType::Radio));
            let tab_index = self.ids.next_tab_index();
            let input = self.host.node_mut(radio)?;
            input.dom_id = Some(option_id.clone());
            input.name = Some(name.clone());
            input.value.clone_from(&item);
            input.tab_index = Some(tab_index);
            input.checked = checked == Some(i);

            let label = self.label(&option_id, item)?;
            self.host.append(wrapper, radio)?;
            self.host.append(wrapper, label)?;
            self.host.append(line, wrapper)?;
            members.push(radio);
        }

        Ok(Parts::simple(line, caption, Backing::RadioGroup(RadioState { members, name })))
    }

    fn static_text(&mut self, common: &Common, spec: StaticTextSpec) -> Result<Parts, PanelError> {
        let line = self.line(common);
        if spec.raw {
            self.host.node_mut(line)?.text = spec.text;
            return Ok(Parts::simple(line, line, Backing::StaticText));
        }
        let node = self.host.create(Tag::Paragraph);
        let para = self.host.node_mut(node)?;
        para.dom_id = Some(common.id.full.clone());
        para.text = spec.text;
        self.host.append(line, node)?;
        Ok(Parts::simple(line, node, Backing::StaticText))
    }

    fn group(&mut self, common: &Common, spec: GroupSpec) -> Result<Parts, PanelError> {
        let css = common.css.clone().unwrap_or_else(|| GROUP_CLASS.to_owned());
        // A disabled group starts collapsed.
        let state = GroupState::from_collapsed(spec.collapsed || !common.enabled);

        let line = self.host.create(Tag::Div);
        let container = self.host.node_mut(line)?;
        container.class = Some(state.class(&css).to_owned());
        container.hidden = !common.show;

        let header = self.host.create(Tag::Div);
        let tab_index = self.ids.next_tab_index();
        let node = self.host.node_mut(header)?;
        node.dom_id = Some(common.id.full.clone());
        node.text.clone_from(&common.label);
        node.tab_index = Some(tab_index);
        node.disabled = !common.enabled;
        self.host.append(line, header)?;

        let mut children: Vec<Built> = Vec::with_capacity(spec.items.len());
        for item in spec.items {
            let child = match self.build(item, Some(&common.id.full)) {
                Ok(child) => child,
                Err(e) => {
                    self.abandon_group(line, children);
                    return Err(e);
                }
            };
            if let Err(e) = self.host.append(line, child.instance.line) {
                children.push(child);
                self.abandon_group(line, children);
                return Err(e.into());
            }
            children.push(child);
        }

        let backing = GroupBacking { state, css, children: children.iter().map(|c| c.instance.id.clone()).collect() };
        Ok(Parts { line, node: header, backing: Backing::Group(backing), children })
    }

    fn abandon_group(&mut self, line: NodeId, children: Vec<Built>) {
        for child in children {
            for id in child.ids() {
                self.ids.retire(&id);
            }
        }
        if let Err(e) = self.host.detach(line) {
            warn!(error = %e, "factory: abandoned group line already gone");
        }
    }

    fn custom(&mut self, common: &Common, mut spec: CustomSpec) -> Result<Parts, PanelError> {
        let line = self.line(common);
        if let Err(e) = self.host.append(line, spec.node) {
            if let Err(detach) = self.host.detach(line) {
                warn!(error = %detach, "factory: custom line already gone");
            }
            return Err(e.into());
        }
        self.host.node_mut(spec.node)?.dom_id = Some(common.id.full.clone());
        if !common.enabled {
            if let Some(hook) = spec.hooks.on_enable.as_mut() {
                hook(self.host, spec.node, false);
            }
        }
        Ok(Parts::simple(line, spec.node, Backing::Custom(spec.hooks)))
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Wrapping line: label and control live and hide together inside it.
    fn line(&mut self, common: &Common) -> NodeId {
        let line = self.host.create(Tag::Div);
        if let Ok(node) = self.host.node_mut(line) {
            node.class = Some(common.css.clone().unwrap_or_else(|| LINE_CLASS.to_owned()));
            node.hidden = !common.show;
        }
        line
    }

    fn label(&mut self, for_id: &str, text: String) -> Result<NodeId, PanelError> {
        let label = self.host.create(Tag::Label);
        let node = self.host.node_mut(label)?;
        node.set_attr("for", for_id);
        node.text = text;
        Ok(label)
    }

    /// Line holding a caption and one element of `tag`.
    fn labelled(
        &mut self,
        common: &Common,
        tag: Tag,
        focusable: bool,
        text: String,
    ) -> Result<(NodeId, NodeId), PanelError> {
        let line = self.line(common);
        let element = self.host.create(tag);
        let tab_index = focusable.then(|| self.ids.next_tab_index());
        let node = self.host.node_mut(element)?;
        node.dom_id = Some(common.id.full.clone());
        node.text = text;
        node.tab_index = tab_index;

        let label = self.label(&common.id.full, common.label.clone())?;
        self.host.append(line, label)?;
        self.host.append(line, element)?;
        Ok((line, element))
    }

    /// Line holding a caption and a focusable input.
    fn labelled_input(&mut self, common: &Common, input: InputType) -> Result<(NodeId, NodeId), PanelError> {
        self.labelled(common, Tag::Input(input), true, String::new())
    }
}

/// Nodes whose disabled flag mirrors the control's enablement.
fn disabled_targets(parts: &Parts) -> Vec<NodeId> {
    match &parts.backing {
        Backing::RadioGroup(radio) => radio.members.clone(),
        _ => vec![parts.node],
    }
}
