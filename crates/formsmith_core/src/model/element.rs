//! Form element entity and its fallback tables.
//!
//! # Responsibility
//! - Define the canonical record for one placed form item.
//! - Provide `create_default` so every new element is fully populated.
//!
//! # Invariants
//! - `id` is stable for the element lifetime and never reused.
//! - `kind` never changes after creation.
//! - Every optional style attribute resolves through `STYLE_FALLBACKS`.

use crate::model::kind::{ElementKind, KindFamily};
use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one element inside a form definition.
pub type ElementId = Uuid;

/// Default choice list for radio/select/combobox kinds.
const DEFAULT_OPTIONS: &[&str] = &["Option 1", "Option 2", "Option 3"];
const DEFAULT_TEXTAREA_ROWS: u32 = 3;
const DEFAULT_NUMBER_STEP: f64 = 1.0;

/// Style fallbacks applied whenever an attribute is absent.
///
/// Order matches the `ElementStyle` field order.
pub const STYLE_FALLBACKS: StyleFallbacks = StyleFallbacks {
    width: "100%",
    background_color: "transparent",
    text_color: "",
    border_width: "0px",
    border_style: "none",
    border_color: "",
    border_radius: "0.375rem",
    padding: "0.5rem",
    padding_x: "",
    padding_y: "",
    margin_x: "",
    margin_y: "",
    font_size: "1rem",
    font_weight: "normal",
    line_height: "",
    letter_spacing: "",
    opacity: "1",
    shadow: "",
};

/// Static fallback table for `ElementStyle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleFallbacks {
    pub width: &'static str,
    pub background_color: &'static str,
    pub text_color: &'static str,
    pub border_width: &'static str,
    pub border_style: &'static str,
    pub border_color: &'static str,
    pub border_radius: &'static str,
    pub padding: &'static str,
    pub padding_x: &'static str,
    pub padding_y: &'static str,
    pub margin_x: &'static str,
    pub margin_y: &'static str,
    pub font_size: &'static str,
    pub font_weight: &'static str,
    pub line_height: &'static str,
    pub letter_spacing: &'static str,
    pub opacity: &'static str,
    pub shadow: &'static str,
}

/// User value carried by a field element.
///
/// Untagged on the wire: `"abc"`, `42`, `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Empty text is the "no value entered" marker for every non-toggle kind.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Named style attributes; every attribute is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<String>,
}

/// Style with every attribute resolved against `STYLE_FALLBACKS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    pub width: String,
    pub background_color: String,
    pub text_color: String,
    pub border_width: String,
    pub border_style: String,
    pub border_color: String,
    pub border_radius: String,
    pub padding: String,
    pub padding_x: String,
    pub padding_y: String,
    pub margin_x: String,
    pub margin_y: String,
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub opacity: String,
    pub shadow: String,
}

impl ElementStyle {
    /// Style block assigned to freshly added elements.
    pub fn initial() -> Self {
        let fallback = STYLE_FALLBACKS;
        Self {
            width: Some(fallback.width.to_string()),
            background_color: Some(fallback.background_color.to_string()),
            text_color: Some(fallback.text_color.to_string()),
            border_radius: Some(fallback.border_radius.to_string()),
            padding: Some(fallback.padding.to_string()),
            font_size: Some(fallback.font_size.to_string()),
            font_weight: Some(fallback.font_weight.to_string()),
            ..Self::default()
        }
    }

    /// Resolves absent attributes through the fallback table.
    pub fn resolved(&self) -> ResolvedStyle {
        let fallback = STYLE_FALLBACKS;
        let pick = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };
        ResolvedStyle {
            width: pick(&self.width, fallback.width),
            background_color: pick(&self.background_color, fallback.background_color),
            text_color: pick(&self.text_color, fallback.text_color),
            border_width: pick(&self.border_width, fallback.border_width),
            border_style: pick(&self.border_style, fallback.border_style),
            border_color: pick(&self.border_color, fallback.border_color),
            border_radius: pick(&self.border_radius, fallback.border_radius),
            padding: pick(&self.padding, fallback.padding),
            padding_x: pick(&self.padding_x, fallback.padding_x),
            padding_y: pick(&self.padding_y, fallback.padding_y),
            margin_x: pick(&self.margin_x, fallback.margin_x),
            margin_y: pick(&self.margin_y, fallback.margin_y),
            font_size: pick(&self.font_size, fallback.font_size),
            font_weight: pick(&self.font_weight, fallback.font_weight),
            line_height: pick(&self.line_height, fallback.line_height),
            letter_spacing: pick(&self.letter_spacing, fallback.letter_spacing),
            opacity: pick(&self.opacity, fallback.opacity),
            shadow: pick(&self.shadow, fallback.shadow),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// CSS-like positioning scheme hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

/// Horizontal alignment for positions and text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Logical placement of an element.
///
/// `x`/`y` are consulted only by the free layout mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPosition {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(rename = "type", default)]
    pub kind: PositionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_row: Option<String>,
    #[serde(default)]
    pub hide_mobile: bool,
    #[serde(default)]
    pub hide_tablet: bool,
    #[serde(default)]
    pub hide_desktop: bool,
}

/// Declared element width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthPreset {
    #[default]
    Full,
    Medium,
    Small,
    Tiny,
    Custom,
}

impl WidthPreset {
    /// Percentage for fixed presets; `None` for `Custom`.
    pub fn percent(self) -> Option<f64> {
        match self {
            Self::Full => Some(100.0),
            Self::Medium => Some(75.0),
            Self::Small => Some(50.0),
            Self::Tiny => Some(25.0),
            Self::Custom => None,
        }
    }
}

/// Unit attached to `customWidth`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidthUnit {
    #[default]
    #[serde(rename = "px")]
    Px,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "rem")]
    Rem,
    #[serde(rename = "em")]
    Em,
}

impl WidthUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Percent => "%",
            Self::Rem => "rem",
            Self::Em => "em",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementSize {
    Xs,
    Small,
    #[default]
    Default,
    Large,
    Xl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    #[default]
    Top,
    Left,
    Right,
    Bottom,
    Hidden,
}

/// One placed item of a form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormElement {
    pub id: ElementId,
    /// Serialized as `type` to match the external schema naming.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Binding key used by expressions and cross-field rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub help_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default)]
    pub style: ElementStyle,
    #[serde(default)]
    pub width: WidthPreset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_width: Option<String>,
    #[serde(default)]
    pub custom_width_unit: WidthUnit,
    #[serde(default)]
    pub size: ElementSize,
    #[serde(default)]
    pub label_position: LabelPosition,
    #[serde(default)]
    pub text_align: Align,
    #[serde(default)]
    pub position: ElementPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_validation: Option<String>,
    /// Editor-only: rejects structural and positional mutation.
    #[serde(default)]
    pub locked: bool,
    /// Editor-only: hidden on the canvas, still part of the definition.
    #[serde(default)]
    pub hidden: bool,
}

impl FormElement {
    /// Creates a fully populated element of `kind` with a generated id.
    ///
    /// # Invariants
    /// - Style is populated from the fallback table.
    /// - Field kinds start with an empty (or unchecked) value.
    /// - Kind-specific defaults (`options`, `rows`, `step`) are filled in.
    pub fn create_default(kind: ElementKind) -> Self {
        Self::create_default_with_id(Uuid::new_v4(), kind)
    }

    /// Creates a default element from a wire kind name.
    ///
    /// # Errors
    /// - `ModelError::UnknownKind` when `kind` is not a supported wire name.
    pub fn create_default_named(kind: &str) -> Result<Self, ModelError> {
        let kind = kind.parse::<ElementKind>()?;
        Ok(Self::create_default(kind))
    }

    /// Creates a default element with a caller-provided id.
    ///
    /// Used by import paths and tests that need deterministic ids.
    pub fn create_default_with_id(id: ElementId, kind: ElementKind) -> Self {
        let family = kind.family();
        let options = match family {
            KindFamily::Choice => DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect(),
            _ => Vec::new(),
        };
        let default_value = match family {
            KindFamily::Toggle => Some(FieldValue::Bool(false)),
            KindFamily::Text | KindFamily::Numeric | KindFamily::Choice | KindFamily::Temporal => {
                Some(FieldValue::empty())
            }
            KindFamily::Action | KindFamily::Layout | KindFamily::Widget => None,
        };

        Self {
            id,
            kind,
            name: None,
            content: kind.default_content().to_string(),
            placeholder: kind.default_placeholder().to_string(),
            help_text: String::new(),
            options,
            default_value,
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            min: None,
            max: None,
            step: (family == KindFamily::Numeric).then_some(DEFAULT_NUMBER_STEP),
            rows: (kind == ElementKind::Textarea).then_some(DEFAULT_TEXTAREA_ROWS),
            style: ElementStyle::initial(),
            width: WidthPreset::Full,
            custom_width: None,
            custom_width_unit: WidthUnit::Px,
            size: ElementSize::Default,
            label_position: LabelPosition::Top,
            text_align: Align::Left,
            position: ElementPosition::default(),
            custom_validation: None,
            locked: false,
            hidden: false,
        }
    }

    /// Current value used by validation; empty when none was entered.
    pub fn value(&self) -> FieldValue {
        match (&self.default_value, self.kind.family()) {
            (Some(value), _) => value.clone(),
            (None, KindFamily::Toggle) => FieldValue::Bool(false),
            (None, _) => FieldValue::empty(),
        }
    }

    /// Name used to reference this element from expressions, if any.
    pub fn binding_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
