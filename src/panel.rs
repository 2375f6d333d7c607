//! The dashboard panel: registry of live controls and the public API.
//!
//! DESIGN
//! ======
//! A `Panel` owns its host tree, its id allocator, its control registry, and
//! its debouncer. Nothing is process-wide, so any number of panels coexist.
//! Controls are registered by prefixed id; `owners` maps every host node that
//! can report input (main element, radio options, group header) back to the
//! owning control, which is how composite controls keep one logical id.
//!
//! Raw input enters through [`Panel::on_event`], programmatic changes through
//! [`Panel::set_value`]; both end in the same dispatch pipeline. The host's
//! event loop calls [`Panel::run_pending`] to deliver notifications whose
//! debounce window has elapsed.

#[cfg(test)]
#[path = "panel_test.rs"]
mod panel_test;

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::accessor;
use crate::config::PanelOptions;
use crate::control::{Backing, ControlInstance};
use crate::descriptor::{ControlKind, ControlSpec, Descriptor};
use crate::dispatch::{Callback, ChangeEvent, Clock, DebounceScope, Debouncer, DispatchHook, Pending, SystemClock};
use crate::error::{HostError, PanelError};
use crate::factory::{Built, Factory};
use crate::group::GroupState;
use crate::host::{HostTree, NodeId, Tag};
use crate::ident::IdAllocator;
use crate::input::{RawEvent, Trigger};
use crate::value::Value;
use crate::visibility;

/// Reference to a control: its caller-facing id or any of its host nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRef {
    Id(String),
    Node(NodeId),
}

impl From<&str> for ControlRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for ControlRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&String> for ControlRef {
    fn from(id: &String) -> Self {
        Self::Id(id.clone())
    }
}

impl From<NodeId> for ControlRef {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

fn group_state(ctl: &ControlInstance) -> GroupState {
    match &ctl.backing {
        Backing::Group(group) => group.state,
        _ => GroupState::default(),
    }
}

/// A declarative control panel.
pub struct Panel {
    instance: Uuid,
    host: HostTree,
    container: NodeId,
    ids: IdAllocator,
    pub(crate) controls: HashMap<String, ControlInstance>,
    owners: HashMap<NodeId, String>,
    callback: Option<Callback>,
    debouncer: Debouncer,
    clock: Box<dyn Clock>,
    hook: DispatchHook,
}

impl Panel {
    /// Create a panel mounted under the root of a fresh host tree.
    #[must_use]
    pub fn new(options: PanelOptions) -> Self {
        Self::with_host(HostTree::new(), None, options)
    }

    /// Create a panel inside an existing host tree, under `parent` (the root by default).
    #[must_use]
    pub fn with_host(mut host: HostTree, parent: Option<NodeId>, options: PanelOptions) -> Self {
        let container = host.create(Tag::Div);
        if let Ok(node) = host.node_mut(container) {
            node.class = Some(options.css.clone());
            node.dom_id.clone_from(&options.id);
        }
        let parent = parent.unwrap_or_else(|| host.root());
        if let Err(e) = host.append(parent, container) {
            warn!(error = %e, "panel: parent unavailable, mounting at root");
            if let Err(e) = host.append(host.root(), container) {
                warn!(error = %e, "panel: container left detached");
            }
        }

        let instance = Uuid::new_v4();
        debug!(
            panel = %instance,
            prefix = options.id_prefix.as_deref().unwrap_or(""),
            debounce_ms = options.debounce_ms,
            scope = ?options.debounce_scope,
            "panel: created"
        );

        Self {
            instance,
            host,
            container,
            ids: IdAllocator::new(options.id_prefix.as_deref(), options.tab_index_start),
            controls: HashMap::new(),
            owners: HashMap::new(),
            callback: None,
            debouncer: Debouncer::new(options.debounce_ms, options.debounce_scope),
            clock: Box::new(SystemClock),
            hook: DispatchHook::default(),
        }
    }

    /// Replace the time source used for timestamps and debounce deadlines.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Install the callback used by controls whose descriptor carries none.
    #[must_use]
    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    // --- Accessors ---

    /// Unique id of this panel instance, used to correlate logs.
    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance
    }

    #[must_use]
    pub fn host(&self) -> &HostTree {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostTree {
        &mut self.host
    }

    /// The panel container node.
    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn debounce_scope(&self) -> DebounceScope {
        self.debouncer.scope()
    }

    /// Look up a live control.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn control(&self, target: impl Into<ControlRef>) -> Result<&ControlInstance, PanelError> {
        let id = self.resolve(&target.into())?;
        self.controls
            .get(&id)
            .ok_or(PanelError::UnknownControl(id))
    }

    /// Caller-facing ids of every live control, in document order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.document_order()
            .into_iter()
            .filter_map(|id| self.controls.get(&id).map(|c| c.short_id.clone()))
            .collect()
    }

    /// Number of notifications waiting for their debounce window.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.debouncer.pending().len()
    }

    /// Deadline of the earliest pending notification.
    #[must_use]
    pub fn next_due(&self) -> Option<i64> {
        self.debouncer.next_due()
    }

    // =========================================================================
    // ADD / REMOVE
    // =========================================================================

    /// Add one control to the panel (or to the group named by its `parent`).
    ///
    /// Returns the control's caller-facing id.
    ///
    /// # Errors
    ///
    /// [`PanelError::DuplicateControl`] for a live explicit id,
    /// [`PanelError::UnknownControl`] for an unresolvable parent, and
    /// [`PanelError::Host`] when the host tree refuses a node.
    pub fn add(&mut self, desc: Descriptor) -> Result<String, PanelError> {
        let parent = desc.parent.clone();
        self.add_under(desc, parent.as_deref())
    }

    /// Add one control under `parent`, overriding the descriptor's own parent.
    ///
    /// # Errors
    ///
    /// Same as [`Panel::add`].
    pub fn add_to(&mut self, desc: Descriptor, parent: &str) -> Result<String, PanelError> {
        self.add_under(desc, Some(parent))
    }

    /// Add controls in order, all under the same parent.
    ///
    /// # Errors
    ///
    /// Stops at the first failing descriptor; earlier ones stay added.
    pub fn add_all(&mut self, descs: Vec<Descriptor>, parent: Option<&str>) -> Result<Vec<String>, PanelError> {
        let mut added = Vec::with_capacity(descs.len());
        for desc in descs {
            let own_parent = desc.parent.clone();
            added.push(self.add_under(desc, parent.or(own_parent.as_deref()))?);
        }
        Ok(added)
    }

    /// Parse and add a descriptor object or an array of them.
    ///
    /// # Errors
    ///
    /// [`PanelError::UnknownControlKind`] or [`PanelError::InvalidDescriptor`]
    /// before anything is added, otherwise as [`Panel::add_all`].
    pub fn add_json(&mut self, value: &serde_json::Value) -> Result<Vec<String>, PanelError> {
        let descs = Descriptor::list_from_json(value)?;
        self.add_all(descs, None)
    }

    /// Parse descriptors and add them all under `parent`.
    ///
    /// # Errors
    ///
    /// Same as [`Panel::add_json`].
    pub fn add_json_to(&mut self, value: &serde_json::Value, parent: &str) -> Result<Vec<String>, PanelError> {
        let descs = Descriptor::list_from_json(value)?;
        self.add_all(descs, Some(parent))
    }

    fn add_under(&mut self, desc: Descriptor, parent: Option<&str>) -> Result<String, PanelError> {
        let (mount, parent_group) = match parent {
            Some(parent) => self.resolve_parent(parent)?,
            None => (self.container, None),
        };
        self.validate(&desc)?;

        let mut factory = Factory { host: &mut self.host, ids: &mut self.ids, default_callback: self.callback.as_ref() };
        let built = factory.build(desc, parent_group.as_deref())?;
        if let Err(e) = factory.host.append(mount, built.instance.line) {
            factory.discard(built);
            return Err(e.into());
        }

        let short = built.instance.short_id.clone();
        let id = built.instance.id.clone();
        debug!(panel = %self.instance, id = %short, kind = %built.instance.kind(), "panel: control added");
        self.register(built);
        if let Some(group) = parent_group {
            if let Some(Backing::Group(backing)) = self.controls.get_mut(&group).map(|c| &mut c.backing) {
                backing.children.push(id);
            }
        }
        Ok(short)
    }

    /// Resolve a parent id to the node to mount into and, for groups, the group id.
    fn resolve_parent(&self, parent: &str) -> Result<(NodeId, Option<String>), PanelError> {
        let full = self.ids.full(parent);
        if let Some(ctl) = self.controls.get(&full) {
            return match ctl.backing {
                Backing::Group(_) => Ok((ctl.line, Some(full))),
                _ => Err(PanelError::UnknownControl(format!("{parent} is not a group"))),
            };
        }
        self.host
            .find(&full)
            .or_else(|| self.host.find(parent))
            .map(|node| (node, None))
            .ok_or_else(|| PanelError::UnknownControl(parent.to_owned()))
    }

    /// Reject duplicate explicit ids and unusable custom nodes before the
    /// host tree is touched.
    fn validate(&self, desc: &Descriptor) -> Result<(), PanelError> {
        fn walk(panel: &Panel, desc: &Descriptor, seen: &mut HashSet<String>) -> Result<(), PanelError> {
            if let Some(id) = &desc.id {
                if panel.ids.is_live(&panel.ids.full(id)) || !seen.insert(id.clone()) {
                    return Err(PanelError::DuplicateControl(id.clone()));
                }
            }
            match &desc.spec {
                ControlSpec::Group(group) => {
                    for item in &group.items {
                        walk(panel, item, seen)?;
                    }
                }
                ControlSpec::Custom(custom) => {
                    if panel.host.node(custom.node)?.parent().is_some() {
                        return Err(HostError::AlreadyMounted(custom.node).into());
                    }
                }
                _ => {}
            }
            Ok(())
        }
        walk(self, desc, &mut HashSet::new())
    }

    fn register(&mut self, built: Built) {
        let Built { instance, children } = built;
        for node in instance.event_nodes() {
            self.owners.insert(node, instance.id.clone());
        }
        self.controls.insert(instance.id.clone(), instance);
        for child in children {
            self.register(child);
        }
    }

    /// Remove a control and all of its descendants. Their ids stay invalid.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn remove(&mut self, target: impl Into<ControlRef>) -> Result<(), PanelError> {
        let id = self.resolve(&target.into())?;
        let (line, parent) = match self.controls.get(&id) {
            Some(ctl) => (ctl.line, ctl.parent.clone()),
            None => return Err(PanelError::UnknownControl(id)),
        };

        let mut removed = 0usize;
        for node in self.host.detach(line)? {
            let Some(owner) = self.owners.remove(&node) else {
                continue;
            };
            if self.controls.remove(&owner).is_some() {
                self.ids.retire(&owner);
                self.debouncer.cancel(&owner);
                removed += 1;
            }
        }
        if let Some(parent) = parent {
            if let Some(Backing::Group(group)) = self.controls.get_mut(&parent).map(|c| &mut c.backing) {
                group.children.retain(|c| *c != id);
            }
        }
        debug!(panel = %self.instance, id = %self.ids.short(&id), removed, "panel: control removed");
        Ok(())
    }

    // =========================================================================
    // VALUE / ENABLE / SHOW
    // =========================================================================

    /// Current logical value; `None` for kinds without one.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn value(&self, target: impl Into<ControlRef>) -> Result<Option<Value>, PanelError> {
        let ctl = self.control(target)?;
        Ok(accessor::get(&self.host, ctl)?)
    }

    /// Set a control's logical value and run the dispatch pipeline.
    ///
    /// Buttons are only relabelled; they dispatch on click. A disabled group
    /// ignores the request, as does any control that rejects the value (a
    /// radio or dropdown with no matching option, an index out of range).
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn set_value(&mut self, target: impl Into<ControlRef>, value: impl Into<Value>) -> Result<(), PanelError> {
        let id = self.resolve(&target.into())?;
        let value = value.into();
        let ctl = self.controls.get_mut(&id).ok_or_else(|| PanelError::UnknownControl(id.clone()))?;
        if matches!(ctl.backing, Backing::Group(_)) && !ctl.enabled {
            trace!(id = %ctl.short_id, "panel: disabled group ignores set");
            return Ok(());
        }
        let kind = ctl.kind();
        let node = ctl.node;
        if !accessor::set(&mut self.host, ctl, &value)? {
            trace!(id = %ctl.short_id, "panel: value rejected");
            return Ok(());
        }
        if kind.has_value() && kind != ControlKind::Button {
            self.dispatch(&id, node)?;
        }
        Ok(())
    }

    /// Enable or disable a control. Disabling a group collapses it first.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn enable(&mut self, target: impl Into<ControlRef>, state: bool) -> Result<(), PanelError> {
        let id = self.resolve(&target.into())?;
        let (kind, node) = {
            let ctl = self.control_mut(&id)?;
            (ctl.kind(), ctl.node)
        };
        if !state && kind == ControlKind::Group {
            self.set_value(ControlRef::Node(node), false)?;
        }
        let ctl = self.controls.get_mut(&id).ok_or_else(|| PanelError::UnknownControl(id.clone()))?;
        visibility::enable(&mut self.host, ctl, state)?;
        debug!(panel = %self.instance, id = %ctl.short_id, state, "panel: enable");
        Ok(())
    }

    /// Show or hide a control's line.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn show(&mut self, target: impl Into<ControlRef>, state: bool) -> Result<(), PanelError> {
        let id = self.resolve(&target.into())?;
        let ctl = self.controls.get_mut(&id).ok_or_else(|| PanelError::UnknownControl(id.clone()))?;
        visibility::show(&mut self.host, ctl, state)?;
        debug!(panel = %self.instance, id = %ctl.short_id, state, "panel: show");
        Ok(())
    }

    /// Show or hide the whole panel.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Host`] if the container was removed from the host.
    pub fn show_panel(&mut self, state: bool) -> Result<(), PanelError> {
        visibility::show_container(&mut self.host, self.container, state)?;
        Ok(())
    }

    /// Whether a control's line is displayed.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn is_visible(&self, target: impl Into<ControlRef>) -> Result<bool, PanelError> {
        Ok(self.control(target)?.visible)
    }

    /// Whether the panel container is displayed.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.host.node(self.container).is_ok_and(|n| !n.hidden)
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Feed a raw host event for `node`. The host has already written any
    /// user edit into the node. Events on disabled nodes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if no control owns the node.
    pub fn on_event(&mut self, node: NodeId, event: RawEvent) -> Result<(), PanelError> {
        let id = self
            .owners
            .get(&node)
            .cloned()
            .ok_or_else(|| PanelError::UnknownControl(node.to_string()))?;
        if self.host.node(node)?.disabled {
            trace!(%node, ?event, "panel: event on disabled node ignored");
            return Ok(());
        }

        let ctl = self.controls.get_mut(&id).ok_or_else(|| PanelError::UnknownControl(id.clone()))?;
        let live = match &ctl.backing {
            Backing::Slider(slider) => slider.live,
            Backing::Textbox { live } => *live,
            _ => false,
        };
        let trigger = match (ctl.kind(), &event) {
            (ControlKind::Slider, RawEvent::Input) => {
                if live { Trigger::Dispatch } else { Trigger::InfoOnly }
            }
            (ControlKind::Slider, RawEvent::Change) => {
                if live { Trigger::InfoOnly } else { Trigger::Dispatch }
            }
            (ControlKind::Textbox, RawEvent::KeyUp) if live => Trigger::Dispatch,
            (ControlKind::Textbox | ControlKind::Checkbox | ControlKind::Color | ControlKind::Dropdown, RawEvent::Change)
            | (ControlKind::Button, RawEvent::Click) => Trigger::Dispatch,
            (ControlKind::RadioGroup, RawEvent::Click) if node != ctl.node => {
                self.host.check_radio(node)?;
                Trigger::Dispatch
            }
            (ControlKind::Group, RawEvent::Click) => {
                let next = group_state(ctl).toggled();
                accessor::set_group_state(&mut self.host, ctl, next)?;
                Trigger::Dispatch
            }
            (ControlKind::Group, RawEvent::KeyDown(key)) => match group_state(ctl).on_key(key) {
                Some(next) => {
                    accessor::set_group_state(&mut self.host, ctl, next)?;
                    Trigger::Dispatch
                }
                None => Trigger::Ignore,
            },
            _ => Trigger::Ignore,
        };

        if let Backing::Slider(slider) = &ctl.backing {
            accessor::refresh_readout(&mut self.host, slider, ctl.node)?;
        }
        if trigger == Trigger::Dispatch {
            self.dispatch(&id, node)?;
        }
        Ok(())
    }

    /// The hook custom controls call from their host handlers.
    #[must_use]
    pub fn custom_dispatch_hook(&self) -> DispatchHook {
        self.hook.clone()
    }

    /// Run the dispatch pipeline for a custom (or any) control right away.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownControl`] if the reference doesn't resolve.
    pub fn notify_changed(&mut self, target: impl Into<ControlRef>) -> Result<(), PanelError> {
        let id = self.resolve(&target.into())?;
        let node = self.control_mut(&id)?.node;
        self.dispatch(&id, node)
    }

    /// Dispatch pipeline: compare with the last emitted value, then schedule.
    fn dispatch(&mut self, id: &str, target: NodeId) -> Result<(), PanelError> {
        let now = self.clock.now_millis();
        let ctl = self
            .controls
            .get_mut(id)
            .ok_or_else(|| PanelError::UnknownControl(id.to_owned()))?;
        let Some(value) = accessor::get(&self.host, ctl)? else {
            return Ok(());
        };
        let Some(callback) = ctl.callback.clone() else {
            return Ok(());
        };
        let kind = ctl.kind();
        if kind != ControlKind::Button && ctl.last_emitted.as_ref() == Some(&value) {
            trace!(id = %ctl.short_id, "dispatch: value unchanged");
            return Ok(());
        }

        let event = ChangeEvent { id: ctl.short_id.clone(), target, kind, value: value.clone(), timestamp: now };
        self.debouncer.schedule(now, id, event, callback);
        // Radio-groups never cache, so re-selecting an option reports again.
        if kind != ControlKind::RadioGroup {
            ctl.last_emitted = Some(value);
        }
        Ok(())
    }

    // =========================================================================
    // EVENT LOOP
    // =========================================================================

    /// Drain the custom dispatch hook and deliver every notification whose
    /// debounce window has elapsed. Returns how many callbacks ran.
    pub fn run_pending(&mut self) -> usize {
        let ready = self.take_ready();
        self.deliver(ready)
    }

    /// Deliver everything pending now, ignoring the debounce window.
    pub fn flush(&mut self) -> usize {
        let all = self.take_all();
        self.deliver(all)
    }

    /// Like [`Panel::run_pending`] but hands the due notifications back
    /// instead of calling them, so a caller sharing the panel can release it
    /// before callbacks run.
    pub fn take_ready(&mut self) -> Vec<Pending> {
        self.drain_hook();
        self.debouncer.take_due(self.clock.now_millis())
    }

    /// Like [`Panel::flush`] but hands the notifications back.
    pub fn take_all(&mut self) -> Vec<Pending> {
        self.drain_hook();
        self.debouncer.take_all()
    }

    /// Current time on the panel clock.
    #[must_use]
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn drain_hook(&mut self) {
        for node in self.hook.drain() {
            let Some(id) = self.owners.get(&node).cloned() else {
                warn!(%node, "dispatch: hook notified for unknown node");
                continue;
            };
            if let Err(e) = self.dispatch(&id, node) {
                warn!(error = %e, %node, "dispatch: hook notification failed");
            }
        }
    }

    fn deliver(&self, pending: Vec<Pending>) -> usize {
        let count = pending.len();
        for p in pending {
            trace!(panel = %self.instance, id = %p.event.id, kind = %p.event.kind, "dispatch: delivered");
            p.callback.call(&p.event);
        }
        count
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    fn resolve(&self, target: &ControlRef) -> Result<String, PanelError> {
        match target {
            ControlRef::Id(short) => {
                let full = self.ids.full(short);
                if self.controls.contains_key(&full) {
                    Ok(full)
                } else {
                    Err(PanelError::UnknownControl(short.clone()))
                }
            }
            ControlRef::Node(node) => self
                .owners
                .get(node)
                .cloned()
                .ok_or_else(|| PanelError::UnknownControl(node.to_string())),
        }
    }

    fn control_mut(&mut self, id: &str) -> Result<&mut ControlInstance, PanelError> {
        self.controls
            .get_mut(id)
            .ok_or_else(|| PanelError::UnknownControl(id.to_owned()))
    }

    /// Resolved ids of live controls in host document order.
    pub(crate) fn document_order(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.host
            .subtree(self.container)
            .into_iter()
            .filter_map(|node| self.owners.get(&node))
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect()
    }
}
