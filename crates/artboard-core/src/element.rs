//! Element data model for the artboard.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of element. Only containers accept dropped children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Button,
    Container,
}

impl ElementKind {
    pub fn is_container(self) -> bool {
        self == ElementKind::Container
    }
}

/// A width or height value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Fixed size in artboard units.
    Px(f64),
    /// Sized by the renderer's layout.
    #[default]
    Auto,
}

impl Dimension {
    /// Numeric value, if fixed.
    pub fn px(self) -> Option<f64> {
        match self {
            Dimension::Px(value) => Some(value),
            Dimension::Auto => None,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Dimension::Auto)
    }

    /// `Auto`, or a finite non-negative size.
    pub fn is_valid(self) -> bool {
        match self {
            Dimension::Px(value) => value.is_finite() && value >= 0.0,
            Dimension::Auto => true,
        }
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Dimension::Px(value)
    }
}

// Serialized as a bare number or the string "auto".
impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dimension::Px(value) => serializer.serialize_f64(*value),
            Dimension::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) if value.is_finite() && value >= 0.0 => Ok(Dimension::Px(value)),
            Raw::Number(value) => Err(D::Error::custom(format!(
                "size must be a non-negative number, got {value}"
            ))),
            Raw::Keyword(keyword) if keyword == "auto" => Ok(Dimension::Auto),
            Raw::Keyword(keyword) => Err(D::Error::custom(format!(
                "expected a number or \"auto\", got {keyword:?}"
            ))),
        }
    }
}

/// How an element lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    /// Children are absolutely positioned by their own offsets.
    #[default]
    Block,
    Flex,
    Grid,
}

impl Display {
    /// Whether children of this layout are positioned by the renderer.
    pub fn is_flow(self) -> bool {
        matches!(self, Display::Flex | Display::Grid)
    }
}

/// Main axis of a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

/// Geometry and layout properties of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementProps {
    /// Offset from the parent's origin (ignored for flow children).
    pub x: f64,
    pub y: f64,
    pub width: Dimension,
    pub height: Dimension,
    pub display: Display,
    pub flex_direction: FlexDirection,
}

impl Default for ElementProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            display: Display::Block,
            flex_direction: FlexDirection::Row,
        }
    }
}

/// A rectangular node on the artboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default)]
    pub parent_id: Option<ElementId>,
    /// Sort key among siblings.
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub props: ElementProps,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_true() -> bool {
    true
}

impl Element {
    /// Create a root element with a generated id and auto size.
    pub fn new(kind: ElementKind) -> Self {
        Self::with_id(ElementId::new(), kind)
    }

    /// Create a root element with a caller-chosen id.
    pub fn with_id(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            index: 0,
            props: ElementProps::default(),
            visible: true,
            locked: false,
        }
    }

    /// Set parent-relative position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.props.x = x;
        self.props.y = y;
        self
    }

    /// Set a fixed size.
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.props.width = Dimension::Px(width);
        self.props.height = Dimension::Px(height);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<ElementId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = index;
        self
    }

    pub fn with_display(mut self, display: Display) -> Self {
        self.props.display = display;
        self
    }

    pub fn with_flex_direction(mut self, direction: FlexDirection) -> Self {
        self.props.flex_direction = direction;
        self
    }

    /// Whether the element accepts dropped children.
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn has_valid_size(&self) -> bool {
        self.props.width.is_valid() && self.props.height.is_valid()
    }

    /// Apply a partial update. Identity and structure fields are untouched.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(x) = patch.x {
            self.props.x = x;
        }
        if let Some(y) = patch.y {
            self.props.y = y;
        }
        if let Some(width) = patch.width {
            self.props.width = width;
        }
        if let Some(height) = patch.height {
            self.props.height = height;
        }
        if let Some(display) = patch.display {
            self.props.display = display;
        }
        if let Some(direction) = patch.flex_direction {
            self.props.flex_direction = direction;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
    }
}

/// Partial update to an element's properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub display: Option<Display>,
    pub flex_direction: Option<FlexDirection>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
}

impl ElementPatch {
    /// Patch that moves an element to a parent-relative position.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Sizes are valid and offsets finite.
    pub fn is_valid(&self) -> bool {
        let finite = |value: Option<f64>| value.is_none_or(f64::is_finite);
        finite(self.x)
            && finite(self.y)
            && self.width.is_none_or(Dimension::is_valid)
            && self.height.is_none_or(Dimension::is_valid)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
