//! Declarative control descriptors.
//!
//! A [`Descriptor`] is the immutable input to [`crate::panel::Panel::add`]:
//! the common attributes every control understands plus a [`ControlSpec`]
//! carrying the kind-specific ones. Descriptors can be built in code or parsed
//! from JSON, where the `kind` field selects the variant (the legacy `type`
//! field and the legacy names `radio` and `text` are accepted too).
//!
//! Closures (callbacks, slider formatters, custom-control hooks) cannot travel
//! through JSON and are attached in code.

#[cfg(test)]
#[path = "descriptor_test.rs"]
mod descriptor_test;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::consts::SLIDER_MAX;
use crate::dispatch::Callback;
use crate::error::PanelError;
use crate::host::{HostTree, NodeId};
use crate::value::Value;

// =============================================================================
// KIND
// =============================================================================

/// The fixed set of control kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Slider,
    Checkbox,
    Textbox,
    Color,
    Dropdown,
    #[serde(alias = "radio")]
    RadioGroup,
    Button,
    Separator,
    Info,
    #[serde(alias = "text")]
    StaticText,
    Link,
    Image,
    Group,
    Custom,
}

impl ControlKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Slider,
        Self::Checkbox,
        Self::Textbox,
        Self::Color,
        Self::Dropdown,
        Self::RadioGroup,
        Self::Button,
        Self::Separator,
        Self::Info,
        Self::StaticText,
        Self::Link,
        Self::Image,
        Self::Group,
        Self::Custom,
    ];

    /// Canonical wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slider => "slider",
            Self::Checkbox => "checkbox",
            Self::Textbox => "textbox",
            Self::Color => "color",
            Self::Dropdown => "dropdown",
            Self::RadioGroup => "radio-group",
            Self::Button => "button",
            Self::Separator => "separator",
            Self::Info => "info",
            Self::StaticText => "static-text",
            Self::Link => "link",
            Self::Image => "image",
            Self::Group => "group",
            Self::Custom => "custom",
        }
    }

    /// Whether the kind takes part in the get/set value protocol.
    #[must_use]
    pub fn has_value(self) -> bool {
        !matches!(self, Self::Separator | Self::StaticText | Self::Link)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlKind {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radio" => Ok(Self::RadioGroup),
            "text" => Ok(Self::StaticText),
            _ => Self::ALL
                .into_iter()
                .find(|k| k.as_str() == s)
                .ok_or_else(|| PanelError::UnknownControlKind(s.to_owned())),
        }
    }
}

// =============================================================================
// CLOSURES
// =============================================================================

/// Display transform for a numeric slider.
#[derive(Clone)]
pub struct Formatter(Rc<dyn Fn(f64) -> String>);

impl Formatter {
    pub fn new(f: impl Fn(f64) -> String + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn format(&self, value: f64) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter(..)")
    }
}

type SetHook = Box<dyn FnMut(&mut HostTree, NodeId, &Value)>;
type GetHook = Box<dyn Fn(&HostTree, NodeId) -> Option<Value>>;
type EnableHook = Box<dyn FnMut(&mut HostTree, NodeId, bool)>;

/// Delegation hooks of a custom control. Missing hooks are no-ops.
#[derive(Default)]
pub struct CustomHooks {
    pub(crate) on_set: Option<SetHook>,
    pub(crate) on_get: Option<GetHook>,
    pub(crate) on_enable: Option<EnableHook>,
}

impl fmt::Debug for CustomHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomHooks")
            .field("on_set", &self.on_set.is_some())
            .field("on_get", &self.on_get.is_some())
            .field("on_enable", &self.on_enable.is_some())
            .finish()
    }
}

// =============================================================================
// PER-KIND SPECS
// =============================================================================

/// Numeric range, or a discrete list when `items` is present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SliderSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
    /// Dispatch on every input signal rather than on commit.
    pub live: bool,
    /// Discrete labels; turns the slider into an index picker.
    pub items: Option<Vec<String>>,
    #[serde(skip)]
    pub formatter: Option<Formatter>,
}

impl Default for SliderSpec {
    fn default() -> Self {
        Self { min: 0.0, max: SLIDER_MAX, step: 1.0, value: 0.0, live: false, items: None, formatter: None }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckboxSpec {
    pub checked: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextboxSpec {
    pub text: String,
    pub placeholder: Option<String>,
    /// Also dispatch on key-up.
    pub live: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorSpec {
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DropdownSpec {
    pub items: Vec<String>,
    /// Initially selected index.
    pub value: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RadioSpec {
    pub items: Vec<String>,
    /// Initially checked index; out of range leaves every option unchecked.
    pub value: i64,
    /// Shared radio name; options of every radio-group using it are exclusive.
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ButtonSpec {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeparatorSpec {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InfoSpec {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticTextSpec {
    pub text: String,
    /// Place the text straight on the line, without an id-bearing paragraph.
    pub raw: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkSpec {
    pub text: Option<String>,
    #[serde(alias = "href")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageSpec {
    #[serde(alias = "url")]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub items: Vec<Descriptor>,
    pub collapsed: bool,
}

/// A caller-built host node driven through delegation hooks.
#[derive(Debug)]
pub struct CustomSpec {
    /// Detached node created in the panel's host tree.
    pub node: NodeId,
    pub hooks: CustomHooks,
}

impl CustomSpec {
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self { node, hooks: CustomHooks::default() }
    }

    #[must_use]
    pub fn on_set(mut self, f: impl FnMut(&mut HostTree, NodeId, &Value) + 'static) -> Self {
        self.hooks.on_set = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_get(mut self, f: impl Fn(&HostTree, NodeId) -> Option<Value> + 'static) -> Self {
        self.hooks.on_get = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_enable(mut self, f: impl FnMut(&mut HostTree, NodeId, bool) + 'static) -> Self {
        self.hooks.on_enable = Some(Box::new(f));
        self
    }
}

/// Kind tag plus kind-specific attributes.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ControlSpec {
    Slider(SliderSpec),
    Checkbox(CheckboxSpec),
    Textbox(TextboxSpec),
    Color(ColorSpec),
    Dropdown(DropdownSpec),
    RadioGroup(RadioSpec),
    Button(ButtonSpec),
    Separator(SeparatorSpec),
    Info(InfoSpec),
    StaticText(StaticTextSpec),
    Link(LinkSpec),
    Image(ImageSpec),
    Group(GroupSpec),
    #[serde(skip)]
    Custom(CustomSpec),
}

impl ControlSpec {
    #[must_use]
    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Slider(_) => ControlKind::Slider,
            Self::Checkbox(_) => ControlKind::Checkbox,
            Self::Textbox(_) => ControlKind::Textbox,
            Self::Color(_) => ControlKind::Color,
            Self::Dropdown(_) => ControlKind::Dropdown,
            Self::RadioGroup(_) => ControlKind::RadioGroup,
            Self::Button(_) => ControlKind::Button,
            Self::Separator(_) => ControlKind::Separator,
            Self::Info(_) => ControlKind::Info,
            Self::StaticText(_) => ControlKind::StaticText,
            Self::Link(_) => ControlKind::Link,
            Self::Image(_) => ControlKind::Image,
            Self::Group(_) => ControlKind::Group,
            Self::Custom(_) => ControlKind::Custom,
        }
    }
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Declarative description of one control.
#[derive(Debug, Deserialize)]
pub struct Descriptor {
    #[serde(flatten)]
    pub spec: ControlSpec,
    /// Un-prefixed id; synthesized from kind and ordinal when absent.
    pub id: Option<String>,
    /// Caption; defaults to kind and ordinal.
    pub label: Option<String>,
    /// Class of the wrapping line (or of an expanded group container).
    pub css: Option<String>,
    /// Initial visibility, default `true`.
    pub show: Option<bool>,
    /// Initial enablement, default `true`.
    pub enabled: Option<bool>,
    /// Model key for [`crate::panel::Panel::bind_to`] and `get_bound`.
    pub bind: Option<String>,
    /// Id of the group (or host node) to mount into.
    pub parent: Option<String>,
    /// Overrides the panel-wide callback.
    #[serde(skip)]
    pub callback: Option<Callback>,
}

impl Descriptor {
    #[must_use]
    pub fn new(spec: ControlSpec) -> Self {
        Self {
            spec,
            id: None,
            label: None,
            css: None,
            show: None,
            enabled: None,
            bind: None,
            parent: None,
            callback: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ControlKind {
        self.spec.kind()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    #[must_use]
    pub fn with_bind(mut self, key: impl Into<String>) -> Self {
        self.bind = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    #[must_use]
    pub fn shown(mut self, show: bool) -> Self {
        self.show = Some(show);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Parse one descriptor object.
    ///
    /// # Errors
    ///
    /// [`PanelError::UnknownControlKind`] when `kind` (or a nested group
    /// item's kind) is missing or not in the fixed set,
    /// [`PanelError::InvalidDescriptor`] when the attributes don't fit the kind
    /// or the kind is `custom`, which needs hooks that JSON can't carry.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, PanelError> {
        let normalized = normalize(value)?;
        Ok(serde_json::from_value(normalized)?)
    }

    /// Parse a single descriptor object or an array of them.
    ///
    /// # Errors
    ///
    /// Same as [`Descriptor::from_json`], for the first offending entry.
    pub fn list_from_json(value: &serde_json::Value) -> Result<Vec<Self>, PanelError> {
        match value {
            serde_json::Value::Array(items) => items.iter().map(Self::from_json).collect(),
            other => Ok(vec![Self::from_json(other)?]),
        }
    }
}

impl From<ControlSpec> for Descriptor {
    fn from(spec: ControlSpec) -> Self {
        Self::new(spec)
    }
}

/// Canonicalize the kind tag (recursively for group items) so unknown kinds
/// surface as [`PanelError::UnknownControlKind`] rather than as serde errors.
fn normalize(value: &serde_json::Value) -> Result<serde_json::Value, PanelError> {
    let Some(fields) = value.as_object() else {
        return Err(serde_json::Error::custom("descriptor must be a JSON object").into());
    };
    let mut fields: Map<String, serde_json::Value> = fields.clone();
    if !fields.contains_key("kind") {
        if let Some(legacy) = fields.remove("type") {
            fields.insert("kind".to_owned(), legacy);
        }
    }

    let kind = match fields.get("kind") {
        Some(serde_json::Value::String(name)) => name.parse::<ControlKind>()?,
        Some(other) => return Err(PanelError::UnknownControlKind(other.to_string())),
        None => return Err(PanelError::UnknownControlKind("<missing>".to_owned())),
    };
    if kind == ControlKind::Custom {
        return Err(serde_json::Error::custom("custom controls carry hooks and must be built in code").into());
    }
    fields.insert("kind".to_owned(), serde_json::Value::String(kind.as_str().to_owned()));

    if kind == ControlKind::Group {
        if let Some(serde_json::Value::Array(items)) = fields.get("items") {
            let items = items.iter().map(normalize).collect::<Result<Vec<_>, _>>()?;
            fields.insert("items".to_owned(), serde_json::Value::Array(items));
        }
    }
    Ok(serde_json::Value::Object(fields))
}
