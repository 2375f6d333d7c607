//! Host tree: the in-memory node arena the panel mounts its widgets into.
//!
//! The host toolkit (DOM, immediate-mode UI, terminal renderer) is expected
//! to mirror this tree and to write user edits (a dragged slider, a typed
//! character, a clicked radio) back into the matching node before reporting
//! the raw event to [`crate::panel::Panel::on_event`]. Node state therefore
//! plays the role of element state: the value accessors read it and write it.
//!
//! Node ids are allocated monotonically and never reused, so a reference to a
//! detached node stays invalid forever.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::HostError;

/// Opaque handle to a node in the [`HostTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Input element flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Range,
    Checkbox,
    Text,
    Color,
    Radio,
}

/// Element tag of a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Generic container.
    Div,
    /// Caption bound to another node through the `for` attribute.
    Label,
    /// Inline text, used for slider readouts.
    Span,
    /// Form input.
    Input(InputType),
    /// Drop-down list.
    Select,
    /// Entry of a [`Tag::Select`].
    Option,
    /// Paragraph of static text.
    Paragraph,
    /// Italic informational text.
    Italic,
    /// Hyperlink.
    Anchor,
    /// Image.
    Image,
    /// Push button.
    Button,
    /// Horizontal rule.
    Rule,
}

/// A single element of the host tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Element tag.
    pub tag: Tag,
    /// Document-wide id, if assigned.
    pub dom_id: Option<String>,
    /// CSS class name.
    pub class: Option<String>,
    /// Inner text (caption, button text, paragraph content).
    pub text: String,
    /// Form value (range position, text content, color, radio value).
    pub value: String,
    /// Checked state of checkboxes and radios.
    pub checked: bool,
    /// Disabled state.
    pub disabled: bool,
    /// `true` when the node is not displayed.
    pub hidden: bool,
    /// Keyboard tab order, if focusable.
    pub tab_index: Option<i32>,
    /// Radio group name.
    pub name: Option<String>,
    /// Selected option index of a [`Tag::Select`].
    pub selected: Option<usize>,
    /// Free-form attributes (`for`, `href`, `src`, `placeholder`, ...).
    pub attrs: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: Tag) -> Self {
        Self {
            tag,
            dom_id: None,
            class: None,
            text: String::new(),
            value: String::new(),
            checked: false,
            disabled: false,
            hidden: false,
            tab_index: None,
            name: None,
            selected: None,
            attrs: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Parent node, if mounted.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Look up a free-form attribute.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Set a free-form attribute.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        self.attrs.insert(key.to_owned(), value.into());
    }
}

/// Arena of host nodes rooted at a document body.
#[derive(Debug, Clone)]
pub struct HostTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl HostTree {
    /// Create a tree holding only the root container.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: vec![Some(Node::new(Tag::Div))], root: NodeId(0) }
    }

    /// The document root every mounted node descends from.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached node.
    pub fn create(&mut self, tag: Tag) -> NodeId {
        self.nodes.push(Some(Node::new(tag)));
        NodeId(self.nodes.len() - 1)
    }

    /// Borrow a live node.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownNode`] for freed or never-allocated ids.
    pub fn node(&self, id: NodeId) -> Result<&Node, HostError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(HostError::UnknownNode(id))
    }

    /// Mutably borrow a live node.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownNode`] for freed or never-allocated ids.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, HostError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(HostError::UnknownNode(id))
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(Option::as_ref).and_then(|n| n.parent)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownNode`] if either node is gone and
    /// [`HostError::AlreadyMounted`] if `child` already has a parent, is the
    /// root, or is an ancestor of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.node(parent)?;
        if self.node(child)?.parent.is_some() || child == self.root {
            return Err(HostError::AlreadyMounted(child));
        }
        if self.ancestors(parent).contains(&child) {
            return Err(HostError::AlreadyMounted(child));
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detach `id` from its parent and free its whole subtree.
    ///
    /// Returns the freed ids in document order.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownNode`] if the node is gone or is the root.
    pub fn detach(&mut self, id: NodeId) -> Result<Vec<NodeId>, HostError> {
        if id == self.root {
            return Err(HostError::UnknownNode(id));
        }
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != id);
        }
        let freed = self.subtree(id);
        for node in &freed {
            if let Some(slot) = self.nodes.get_mut(node.0) {
                *slot = None;
            }
        }
        Ok(freed)
    }

    /// `id` followed by all of its descendants in document order.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Ok(node) = self.node(next) else {
                continue;
            };
            out.push(next);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_of(id);
        while let Some(next) = cursor {
            out.push(next);
            cursor = self.parent_of(next);
        }
        out
    }

    /// First mounted node carrying `dom_id`, in document order.
    #[must_use]
    pub fn find(&self, dom_id: &str) -> Option<NodeId> {
        self.subtree(self.root).into_iter().find(|id| {
            self.node(*id)
                .map_or(false, |n| n.dom_id.as_deref() == Some(dom_id))
        })
    }

    /// Check a radio node and uncheck every other mounted radio sharing its name.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownNode`] if the node is gone.
    pub fn check_radio(&mut self, id: NodeId) -> Result<(), HostError> {
        let name = self.node(id)?.name.clone();
        if let Some(name) = name {
            for other in self.subtree(self.root) {
                if other == id {
                    continue;
                }
                let node = self.node_mut(other)?;
                if node.tag == Tag::Input(InputType::Radio) && node.name.as_deref() == Some(&name) {
                    node.checked = false;
                }
            }
        }
        self.node_mut(id)?.checked = true;
        Ok(())
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always `false`: the root is never freed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for HostTree {
    fn default() -> Self {
        Self::new()
    }
}
