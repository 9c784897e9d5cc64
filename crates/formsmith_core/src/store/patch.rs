//! Partial element updates.

use crate::model::element::{
    Align, ElementPosition, ElementSize, ElementStyle, FieldValue, FormElement, LabelPosition,
    PositionType, WidthPreset, WidthUnit,
};
use serde::{Deserialize, Deserializer};

/// Field-by-field update for one element.
///
/// Absent fields are left untouched. For nullable attributes the outer
/// `Option` means "present in the patch" and the inner one is the new value,
/// so `Some(None)` clears the attribute. Style and position patches merge
/// attribute-wise.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    // Content scope: allowed on locked elements.
    pub content: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub options: Option<Vec<String>>,
    #[serde(deserialize_with = "present")]
    pub default_value: Option<Option<FieldValue>>,
    #[serde(deserialize_with = "present")]
    pub name: Option<Option<String>>,
    pub locked: Option<bool>,
    pub hidden: Option<bool>,

    // Constraints.
    pub required: Option<bool>,
    #[serde(deserialize_with = "present")]
    pub min_length: Option<Option<u32>>,
    #[serde(deserialize_with = "present")]
    pub max_length: Option<Option<u32>>,
    #[serde(deserialize_with = "present")]
    pub pattern: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub min: Option<Option<f64>>,
    #[serde(deserialize_with = "present")]
    pub max: Option<Option<f64>>,
    #[serde(deserialize_with = "present")]
    pub step: Option<Option<f64>>,
    #[serde(deserialize_with = "present")]
    pub rows: Option<Option<u32>>,
    #[serde(deserialize_with = "present")]
    pub custom_validation: Option<Option<String>>,

    // Presentation and placement.
    pub style: Option<StylePatch>,
    pub width: Option<WidthPreset>,
    #[serde(deserialize_with = "present")]
    pub custom_width: Option<Option<String>>,
    pub custom_width_unit: Option<WidthUnit>,
    pub size: Option<ElementSize>,
    pub label_position: Option<LabelPosition>,
    pub text_align: Option<Align>,
    pub position: Option<PositionPatch>,
}

/// Attribute-wise style update; `Some(None)` falls back to the default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylePatch {
    #[serde(deserialize_with = "present")]
    pub width: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub background_color: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub text_color: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub border_width: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub border_style: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub border_color: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub border_radius: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub padding: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub padding_x: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub padding_y: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub margin_x: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub margin_y: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub font_size: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub font_weight: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub line_height: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub letter_spacing: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub opacity: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub shadow: Option<Option<String>>,
}

impl StylePatch {
    pub fn apply_to(&self, style: &mut ElementStyle) {
        set(&mut style.width, &self.width);
        set(&mut style.background_color, &self.background_color);
        set(&mut style.text_color, &self.text_color);
        set(&mut style.border_width, &self.border_width);
        set(&mut style.border_style, &self.border_style);
        set(&mut style.border_color, &self.border_color);
        set(&mut style.border_radius, &self.border_radius);
        set(&mut style.padding, &self.padding);
        set(&mut style.padding_x, &self.padding_x);
        set(&mut style.padding_y, &self.padding_y);
        set(&mut style.margin_x, &self.margin_x);
        set(&mut style.margin_y, &self.margin_y);
        set(&mut style.font_size, &self.font_size);
        set(&mut style.font_weight, &self.font_weight);
        set(&mut style.line_height, &self.line_height);
        set(&mut style.letter_spacing, &self.letter_spacing);
        set(&mut style.opacity, &self.opacity);
        set(&mut style.shadow, &self.shadow);
    }
}

/// Attribute-wise position update; untouched keys keep their values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<PositionType>,
    #[serde(deserialize_with = "present")]
    pub top: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub right: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub bottom: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub left: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub z_index: Option<Option<i32>>,
    #[serde(deserialize_with = "present")]
    pub align: Option<Option<Align>>,
    #[serde(deserialize_with = "present")]
    pub grid_column: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub grid_row: Option<Option<String>>,
    pub hide_mobile: Option<bool>,
    pub hide_tablet: Option<bool>,
    pub hide_desktop: Option<bool>,
}

impl PositionPatch {
    pub fn apply_to(&self, position: &mut ElementPosition) {
        set(&mut position.x, &self.x);
        set(&mut position.y, &self.y);
        set(&mut position.kind, &self.kind);
        set(&mut position.top, &self.top);
        set(&mut position.right, &self.right);
        set(&mut position.bottom, &self.bottom);
        set(&mut position.left, &self.left);
        set(&mut position.z_index, &self.z_index);
        set(&mut position.align, &self.align);
        set(&mut position.grid_column, &self.grid_column);
        set(&mut position.grid_row, &self.grid_row);
        set(&mut position.hide_mobile, &self.hide_mobile);
        set(&mut position.hide_tablet, &self.hide_tablet);
        set(&mut position.hide_desktop, &self.hide_desktop);
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

/// Maps an explicit JSON `null` to `Some(None)` instead of `None`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ElementPatch {
    /// Parses a patch from its JSON shape.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the patch changes anything outside the content scope.
    ///
    /// Locked elements reject such patches.
    pub fn touches_locked_scope(&self) -> bool {
        self.required.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
            || self.pattern.is_some()
            || self.min.is_some()
            || self.max.is_some()
            || self.step.is_some()
            || self.rows.is_some()
            || self.custom_validation.is_some()
            || self.style.is_some()
            || self.width.is_some()
            || self.custom_width.is_some()
            || self.custom_width_unit.is_some()
            || self.size.is_some()
            || self.label_position.is_some()
            || self.text_align.is_some()
            || self.position.is_some()
    }

    /// Writes every present field into `element`.
    pub fn apply_to(&self, element: &mut FormElement) {
        set(&mut element.content, &self.content);
        set(&mut element.placeholder, &self.placeholder);
        set(&mut element.help_text, &self.help_text);
        set(&mut element.options, &self.options);
        set(&mut element.default_value, &self.default_value);
        set(&mut element.name, &self.name);
        set(&mut element.locked, &self.locked);
        set(&mut element.hidden, &self.hidden);

        set(&mut element.required, &self.required);
        set(&mut element.min_length, &self.min_length);
        set(&mut element.max_length, &self.max_length);
        set(&mut element.pattern, &self.pattern);
        set(&mut element.min, &self.min);
        set(&mut element.max, &self.max);
        set(&mut element.step, &self.step);
        set(&mut element.rows, &self.rows);
        set(&mut element.custom_validation, &self.custom_validation);

        if let Some(style) = &self.style {
            style.apply_to(&mut element.style);
        }
        set(&mut element.width, &self.width);
        set(&mut element.custom_width, &self.custom_width);
        set(&mut element.custom_width_unit, &self.custom_width_unit);
        set(&mut element.size, &self.size);
        set(&mut element.label_position, &self.label_position);
        set(&mut element.text_align, &self.text_align);
        if let Some(position) = &self.position {
            position.apply_to(&mut element.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementPatch, PositionPatch, StylePatch};
    use crate::model::element::{Align, ElementStyle, FieldValue, FormElement};
    use crate::model::kind::ElementKind;

    #[test]
    fn explicit_null_clears_nullable_attribute() {
        let patch = ElementPatch::from_json(r#"{"pattern": null, "content": "Email"}"#).unwrap();
        assert_eq!(patch.pattern, Some(None));
        assert_eq!(patch.min, None);

        let mut element = FormElement::create_default(ElementKind::Text);
        element.pattern = Some("^a".to_string());
        patch.apply_to(&mut element);
        assert_eq!(element.pattern, None);
        assert_eq!(element.content, "Email");
    }

    #[test]
    fn content_scope_patch_does_not_touch_locked_scope() {
        let patch = ElementPatch {
            content: Some("Name".to_string()),
            default_value: Some(Some(FieldValue::Text("Ada".to_string()))),
            locked: Some(false),
            ..ElementPatch::default()
        };
        assert!(!patch.touches_locked_scope());

        let patch = ElementPatch {
            required: Some(true),
            ..ElementPatch::default()
        };
        assert!(patch.touches_locked_scope());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ElementPatch::default().is_empty());
        assert!(ElementPatch::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn style_patch_overrides_only_present_attributes() {
        let mut style = ElementStyle::initial();
        let patch = StylePatch {
            text_color: Some(Some("#ff0000".to_string())),
            ..StylePatch::default()
        };
        patch.apply_to(&mut style);
        assert_eq!(style.text_color.as_deref(), Some("#ff0000"));
        assert_eq!(style.padding.as_deref(), Some("0.5rem"));
    }

    #[test]
    fn style_null_falls_back_to_default() {
        let mut element = FormElement::create_default(ElementKind::Text);
        ElementPatch::from_json(r#"{"style": {"fontSize": "2rem"}}"#)
            .unwrap()
            .apply_to(&mut element);
        assert_eq!(element.style.resolved().font_size, "2rem");

        let patch = ElementPatch::from_json(r#"{"style": {"fontSize": null}}"#).unwrap();
        assert_eq!(patch.style.as_ref().unwrap().font_size, Some(None));
        patch.apply_to(&mut element);
        assert_eq!(element.style.font_size, None);
        assert_eq!(element.style.resolved().font_size, "1rem");
        assert_eq!(element.style.padding.as_deref(), Some("0.5rem"));
    }

    #[test]
    fn position_patch_keeps_unmentioned_keys() {
        let mut element = FormElement::create_default(ElementKind::Text);
        element.position.x = 120.0;
        element.position.y = 80.0;
        element.position.z_index = Some(3);
        element.position.align = Some(Align::Center);
        element.position.grid_column = Some("1 / 4".to_string());

        let patch = ElementPatch::from_json(r#"{"position": {"hideMobile": true}}"#).unwrap();
        patch.apply_to(&mut element);
        assert!(element.position.hide_mobile);
        assert_eq!((element.position.x, element.position.y), (120.0, 80.0));
        assert_eq!(element.position.z_index, Some(3));
        assert_eq!(element.position.align, Some(Align::Center));
        assert_eq!(element.position.grid_column.as_deref(), Some("1 / 4"));

        let clear = PositionPatch {
            z_index: Some(None),
            ..PositionPatch::default()
        };
        ElementPatch {
            position: Some(clear),
            ..ElementPatch::default()
        }
        .apply_to(&mut element);
        assert_eq!(element.position.z_index, None);
        assert_eq!(element.position.x, 120.0);
    }
}
