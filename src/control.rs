//! Live control instances and their per-kind backing state.

use crate::descriptor::{ControlKind, CustomHooks, Formatter};
use crate::dispatch::Callback;
use crate::group::GroupState;
use crate::host::NodeId;
use crate::value::Value;

/// Numeric range and display transform of a slider.
#[derive(Debug, Clone)]
pub struct SliderState {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub live: bool,
    /// Readout span.
    pub readout: NodeId,
    /// Discrete labels, indexed by the slider value.
    pub items: Option<Vec<String>>,
    pub formatter: Option<Formatter>,
}

impl SliderState {
    /// Clamp into `[min, max]` and snap to the step grid anchored at `min`.
    #[must_use]
    pub fn sanitize(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return self.min;
        }
        let clamped = raw.clamp(self.min, self.max.max(self.min));
        if self.step <= 0.0 {
            return clamped;
        }
        let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
        if snapped > self.max {
            self.min + ((self.max - self.min) / self.step).floor() * self.step
        } else {
            snapped
        }
    }

    /// Text shown in the readout for `value`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn display(&self, value: f64) -> String {
        if let Some(items) = &self.items {
            return items.get(value.max(0.0) as usize).cloned().unwrap_or_default();
        }
        match &self.formatter {
            Some(f) => f.format(value),
            None => crate::value::format_number(value),
        }
    }
}

/// Options of a radio-group: many primitives, one logical id.
#[derive(Debug, Clone)]
pub struct RadioState {
    /// Radio primitives in option order.
    pub members: Vec<NodeId>,
    /// Shared radio name.
    pub name: String,
}

/// Header, state, and children of a collapsible group.
#[derive(Debug, Clone)]
pub struct GroupBacking {
    pub state: GroupState,
    /// Class applied to the container while expanded.
    pub css: String,
    /// Resolved ids of direct children, in insertion order.
    pub children: Vec<String>,
}

/// Kind-specific backing state. One variant per kind.
#[derive(Debug)]
pub enum Backing {
    Slider(SliderState),
    Checkbox,
    Textbox { live: bool },
    Color,
    Dropdown,
    RadioGroup(RadioState),
    Button,
    Separator,
    Info,
    StaticText,
    Link,
    Image,
    Group(GroupBacking),
    Custom(CustomHooks),
}

impl Backing {
    #[must_use]
    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Slider(_) => ControlKind::Slider,
            Self::Checkbox => ControlKind::Checkbox,
            Self::Textbox { .. } => ControlKind::Textbox,
            Self::Color => ControlKind::Color,
            Self::Dropdown => ControlKind::Dropdown,
            Self::RadioGroup(_) => ControlKind::RadioGroup,
            Self::Button => ControlKind::Button,
            Self::Separator => ControlKind::Separator,
            Self::Info => ControlKind::Info,
            Self::StaticText => ControlKind::StaticText,
            Self::Link => ControlKind::Link,
            Self::Image => ControlKind::Image,
            Self::Group(_) => ControlKind::Group,
            Self::Custom(_) => ControlKind::Custom,
        }
    }
}

/// A control built from a descriptor and owned by the panel.
#[derive(Debug)]
pub struct ControlInstance {
    /// Prefixed id, unique within the panel.
    pub id: String,
    /// Id as the caller knows it.
    pub short_id: String,
    /// Wrapping line; show/hide acts on it so label and control move together.
    pub line: NodeId,
    /// Main element: the reference reported as the event target.
    pub node: NodeId,
    pub enabled: bool,
    pub visible: bool,
    pub bind: Option<String>,
    pub callback: Option<Callback>,
    /// Last value delivered to the dispatch pipeline; guards duplicates.
    pub last_emitted: Option<Value>,
    /// Enclosing group, as a lookup relation only.
    pub parent: Option<String>,
    pub backing: Backing,
}

impl ControlInstance {
    #[must_use]
    pub fn kind(&self) -> ControlKind {
        self.backing.kind()
    }

    /// Host nodes that route raw events to this control.
    #[must_use]
    pub fn event_nodes(&self) -> Vec<NodeId> {
        match &self.backing {
            Backing::RadioGroup(radio) => {
                let mut nodes = vec![self.node];
                nodes.extend(&radio.members);
                nodes
            }
            _ => vec![self.node],
        }
    }
}
