//! Layout resolver: logical position to effective paint geometry.
//!
//! # Responsibility
//! - Map `(element, flow index, layout mode, breakpoint)` to geometry the
//!   renderer can paint without consulting any other state.
//!
//! # Invariants
//! - Resolution is pure and deterministic; the store never calls it.
//! - Visibility is an exact breakpoint match on the three hide flags. Hiding
//!   on mobile says nothing about tablet or desktop.
//! - Width is always defined: unparseable custom widths fall back to 100%.

use crate::model::definition::FormDefinition;
use crate::model::element::{Align, ElementId, FormElement, WidthUnit};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const MOBILE_MAX_WIDTH_PX: u32 = 768;
const TABLET_MAX_WIDTH_PX: u32 = 1024;

/// Canvas arrangement chosen in the editor toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Free,
    Grid,
    Columns,
    Rows,
}

/// Responsive breakpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl Breakpoint {
    /// Classifies a viewport width: `< 768` mobile, `< 1024` tablet.
    pub fn from_viewport_width(width_px: u32) -> Self {
        if width_px < MOBILE_MAX_WIDTH_PX {
            Self::Mobile
        } else if width_px < TABLET_MAX_WIDTH_PX {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }
}

/// Where the element is painted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Placement {
    /// Free layout: absolute offsets in logical units.
    Absolute { x: f64, y: f64 },
    /// Flow layouts: position is the list order.
    Flow { order: usize },
}

/// Effective width after applying the layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EffectiveWidth {
    Percent { value: f64 },
    Fixed { value: f64, unit: WidthUnit },
    GridSpan { start: Option<u32>, span: u32, columns: u32 },
}

impl Display for EffectiveWidth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percent { value } => write!(f, "{value}%"),
            Self::Fixed { value, unit } => write!(f, "{value}{}", unit.suffix()),
            Self::GridSpan {
                start: Some(start),
                span,
                ..
            } => write!(f, "{start} / span {span}"),
            Self::GridSpan { start: None, span, .. } => write!(f, "span {span}"),
        }
    }
}

/// Resolution inputs other than the element itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutContext {
    pub mode: LayoutMode,
    pub breakpoint: Breakpoint,
    pub grid_columns: u32,
}

impl LayoutContext {
    pub fn new(mode: LayoutMode, breakpoint: Breakpoint, grid_columns: u32) -> Self {
        Self {
            mode,
            breakpoint,
            grid_columns: grid_columns.max(1),
        }
    }
}

/// Geometry handed to the renderer for one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedGeometry {
    pub element_id: ElementId,
    pub placement: Placement,
    pub width: EffectiveWidth,
    pub visible: bool,
    pub z_index: i32,
    pub align: Align,
}

/// Resolves one element placed at `flow_index` in its definition.
pub fn resolve(element: &FormElement, flow_index: usize, ctx: &LayoutContext) -> ResolvedGeometry {
    let placement = match ctx.mode {
        LayoutMode::Free => Placement::Absolute {
            x: element.position.x,
            y: element.position.y,
        },
        LayoutMode::Grid | LayoutMode::Columns | LayoutMode::Rows => {
            Placement::Flow { order: flow_index }
        }
    };

    let width = match ctx.mode {
        LayoutMode::Free | LayoutMode::Columns => declared_width(element),
        LayoutMode::Rows => EffectiveWidth::Percent { value: 100.0 },
        LayoutMode::Grid => grid_span(element.position.grid_column.as_deref(), ctx.grid_columns),
    };

    ResolvedGeometry {
        element_id: element.id,
        placement,
        width,
        visible: is_visible(element, ctx.breakpoint),
        z_index: element.position.z_index.unwrap_or(0),
        align: element.position.align.unwrap_or_default(),
    }
}

/// Resolves every element of `definition` in list order.
pub fn resolve_all(definition: &FormDefinition, ctx: &LayoutContext) -> Vec<ResolvedGeometry> {
    definition
        .elements
        .iter()
        .enumerate()
        .map(|(index, element)| resolve(element, index, ctx))
        .collect()
}

/// Exact-match visibility; flags never cascade between breakpoints.
pub fn is_visible(element: &FormElement, breakpoint: Breakpoint) -> bool {
    let hidden = match breakpoint {
        Breakpoint::Mobile => element.position.hide_mobile,
        Breakpoint::Tablet => element.position.hide_tablet,
        Breakpoint::Desktop => element.position.hide_desktop,
    };
    !hidden
}

fn declared_width(element: &FormElement) -> EffectiveWidth {
    if let Some(value) = element.width.percent() {
        return EffectiveWidth::Percent { value };
    }
    let parsed = element
        .custom_width
        .as_deref()
        .and_then(parse_custom_width);
    match parsed {
        Some(value) if element.custom_width_unit == WidthUnit::Percent => {
            EffectiveWidth::Percent { value }
        }
        Some(value) => EffectiveWidth::Fixed {
            value,
            unit: element.custom_width_unit,
        },
        None => EffectiveWidth::Percent { value: 100.0 },
    }
}

fn parse_custom_width(raw: &str) -> Option<f64> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Parses `start/end` (CSS grid-column shorthand) into a span.
fn grid_span(grid_column: Option<&str>, columns: u32) -> EffectiveWidth {
    let auto = EffectiveWidth::GridSpan {
        start: None,
        span: 1,
        columns,
    };
    let Some(raw) = grid_column else {
        return auto;
    };
    let Some((start, end)) = raw.split_once('/') else {
        return auto;
    };
    match (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
        (Ok(start), Ok(end)) if start >= 1 && end > start => EffectiveWidth::GridSpan {
            start: Some(start),
            span: (end - start).min(columns),
            columns,
        },
        _ => auto,
    }
}
