//! Closed set of element kinds and their per-kind defaults.
//!
//! # Responsibility
//! - Map wire names (`"text"`, `"alert-dialog"`, ...) to a closed enum.
//! - Classify every kind into a family that decides value type and which
//!   optional fields are meaningful.
//!
//! # Invariants
//! - Unknown wire names are rejected with `ModelError::UnknownKind`; there is
//!   no generic placeholder kind.

use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Element kind, serialized under the external `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    // Layout primitives.
    Title,
    Subtitle,
    Heading,
    Paragraph,
    Divider,
    Separator,
    Spacer,
    // Inputs.
    Text,
    Input,
    Number,
    Textarea,
    Date,
    Checkbox,
    Radio,
    Select,
    Button,
    // Structural UI widgets.
    Accordion,
    Alert,
    AlertDialog,
    AspectRatio,
    Avatar,
    Badge,
    Breadcrumb,
    Calendar,
    Card,
    Carousel,
    Chart,
    Collapsible,
    Combobox,
    Command,
    ContextMenu,
    DataTable,
    DatePicker,
    Dialog,
    Drawer,
    DropdownMenu,
}

/// Behavioural grouping of kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFamily {
    /// Free text value (`text`, `input`, `textarea`).
    Text,
    /// Numeric value with `min`/`max`/`step`.
    Numeric,
    /// One value out of `options`.
    Choice,
    /// Boolean checked state.
    Toggle,
    /// ISO calendar date string.
    Temporal,
    /// Buttons: no value.
    Action,
    /// Headings, dividers and spacers: no value.
    Layout,
    /// Display-only UI widgets: no value.
    Widget,
}

const ALL_KINDS: &[ElementKind] = &[
    ElementKind::Title,
    ElementKind::Subtitle,
    ElementKind::Heading,
    ElementKind::Paragraph,
    ElementKind::Divider,
    ElementKind::Separator,
    ElementKind::Spacer,
    ElementKind::Text,
    ElementKind::Input,
    ElementKind::Number,
    ElementKind::Textarea,
    ElementKind::Date,
    ElementKind::Checkbox,
    ElementKind::Radio,
    ElementKind::Select,
    ElementKind::Button,
    ElementKind::Accordion,
    ElementKind::Alert,
    ElementKind::AlertDialog,
    ElementKind::AspectRatio,
    ElementKind::Avatar,
    ElementKind::Badge,
    ElementKind::Breadcrumb,
    ElementKind::Calendar,
    ElementKind::Card,
    ElementKind::Carousel,
    ElementKind::Chart,
    ElementKind::Collapsible,
    ElementKind::Combobox,
    ElementKind::Command,
    ElementKind::ContextMenu,
    ElementKind::DataTable,
    ElementKind::DatePicker,
    ElementKind::Dialog,
    ElementKind::Drawer,
    ElementKind::DropdownMenu,
];

impl ElementKind {
    /// Returns every supported kind in palette order.
    pub fn all() -> &'static [ElementKind] {
        ALL_KINDS
    }

    /// Stable wire name used in JSON and by host UIs.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::Divider => "divider",
            Self::Separator => "separator",
            Self::Spacer => "spacer",
            Self::Text => "text",
            Self::Input => "input",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Select => "select",
            Self::Button => "button",
            Self::Accordion => "accordion",
            Self::Alert => "alert",
            Self::AlertDialog => "alert-dialog",
            Self::AspectRatio => "aspect-ratio",
            Self::Avatar => "avatar",
            Self::Badge => "badge",
            Self::Breadcrumb => "breadcrumb",
            Self::Calendar => "calendar",
            Self::Card => "card",
            Self::Carousel => "carousel",
            Self::Chart => "chart",
            Self::Collapsible => "collapsible",
            Self::Combobox => "combobox",
            Self::Command => "command",
            Self::ContextMenu => "context-menu",
            Self::DataTable => "data-table",
            Self::DatePicker => "date-picker",
            Self::Dialog => "dialog",
            Self::Drawer => "drawer",
            Self::DropdownMenu => "dropdown-menu",
        }
    }

    pub fn family(self) -> KindFamily {
        match self {
            Self::Text | Self::Input | Self::Textarea => KindFamily::Text,
            Self::Number => KindFamily::Numeric,
            Self::Radio | Self::Select | Self::Combobox => KindFamily::Choice,
            Self::Checkbox => KindFamily::Toggle,
            Self::Date | Self::DatePicker => KindFamily::Temporal,
            Self::Button => KindFamily::Action,
            Self::Title
            | Self::Subtitle
            | Self::Heading
            | Self::Paragraph
            | Self::Divider
            | Self::Separator
            | Self::Spacer => KindFamily::Layout,
            _ => KindFamily::Widget,
        }
    }

    /// Whether elements of this kind carry a user value and get validated.
    pub fn is_field(self) -> bool {
        matches!(
            self.family(),
            KindFamily::Text
                | KindFamily::Numeric
                | KindFamily::Choice
                | KindFamily::Toggle
                | KindFamily::Temporal
        )
    }

    /// Default label/content for a freshly added element.
    pub fn default_content(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Subtitle => "Subtitle",
            Self::Heading => "Heading",
            Self::Paragraph => "This is a paragraph of text.",
            Self::Button => "Button",
            Self::Text | Self::Input => "Label",
            Self::Number => "Number",
            Self::Textarea => "Text Area Label",
            Self::Date => "Date",
            Self::Checkbox => "Checkbox Label",
            Self::Radio => "Radio Button",
            Self::Select => "Select Option",
            Self::Divider | Self::Separator | Self::Spacer => "",
            Self::Accordion => "Accordion",
            Self::Alert => "Alert",
            Self::AlertDialog => "Alert Dialog",
            Self::AspectRatio => "Aspect Ratio",
            Self::Avatar => "Avatar",
            Self::Badge => "Badge",
            Self::Breadcrumb => "Breadcrumb",
            Self::Calendar => "Calendar",
            Self::Card => "Card",
            Self::Carousel => "Carousel",
            Self::Chart => "Chart",
            Self::Collapsible => "Collapsible",
            Self::Combobox => "Combobox",
            Self::Command => "Command",
            Self::ContextMenu => "Context Menu",
            Self::DataTable => "Data Table",
            Self::DatePicker => "Date Picker",
            Self::Dialog => "Dialog",
            Self::Drawer => "Drawer",
            Self::DropdownMenu => "Dropdown Menu",
        }
    }

    /// Default placeholder; empty for kinds without one.
    pub fn default_placeholder(self) -> &'static str {
        match self.family() {
            KindFamily::Text | KindFamily::Numeric => "Enter text",
            KindFamily::Choice => "Select an option",
            KindFamily::Temporal => "YYYY-MM-DD",
            _ => "",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ElementKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.wire_name() == normalized)
            .ok_or_else(|| ModelError::UnknownKind(normalized.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementKind, KindFamily};
    use crate::model::ModelError;

    #[test]
    fn wire_names_roundtrip_through_from_str() {
        for kind in ElementKind::all() {
            let parsed: ElementKind = kind.wire_name().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
    }

    #[test]
    fn serde_name_matches_wire_name() {
        for kind in ElementKind::all() {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.wire_name());
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "hologram".parse::<ElementKind>().unwrap_err();
        assert_eq!(err, ModelError::UnknownKind("hologram".to_string()));
    }

    #[test]
    fn only_value_carrying_families_are_fields() {
        assert!(ElementKind::Text.is_field());
        assert!(ElementKind::Checkbox.is_field());
        assert!(ElementKind::DatePicker.is_field());
        assert!(!ElementKind::Button.is_field());
        assert!(!ElementKind::Divider.is_field());
        assert_eq!(ElementKind::Card.family(), KindFamily::Widget);
    }
}
