//! Definition-save configuration check.
//!
//! Catches author mistakes (impossible ranges, broken patterns) before a
//! definition leaves the engine. Never runs on the field-validate path.

use crate::expr::CompiledRule;
use crate::model::definition::FormDefinition;
use crate::model::element::ElementId;
use crate::validation::cross_field::CrossFieldRule;
use crate::validation::field::compile_pattern;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Valid `rows` range for multi-line inputs.
pub const ROWS_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// One configuration problem found in a definition.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionConfigError {
    DuplicateElementId(ElementId),
    LengthBounds {
        element_id: ElementId,
        min_length: u32,
        max_length: u32,
    },
    ValueBounds {
        element_id: ElementId,
        min: f64,
        max: f64,
    },
    NonPositiveStep {
        element_id: ElementId,
        step: f64,
    },
    RowsOutOfRange {
        element_id: ElementId,
        rows: u32,
    },
    InvalidPattern(ElementId),
    InvalidCustomValidation(ElementId),
    UnknownRuleElement {
        rule: String,
        element_id: ElementId,
    },
}

impl Display for DefinitionConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateElementId(id) => write!(f, "duplicate element id `{id}`"),
            Self::LengthBounds {
                element_id,
                min_length,
                max_length,
            } => write!(
                f,
                "element `{element_id}`: maxLength {max_length} must exceed minLength {min_length}"
            ),
            Self::ValueBounds {
                element_id,
                min,
                max,
            } => write!(f, "element `{element_id}`: max {max} must exceed min {min}"),
            Self::NonPositiveStep { element_id, step } => {
                write!(f, "element `{element_id}`: step {step} must be positive")
            }
            Self::RowsOutOfRange { element_id, rows } => write!(
                f,
                "element `{element_id}`: rows {rows} must be within {}..={}",
                ROWS_RANGE.start(),
                ROWS_RANGE.end()
            ),
            Self::InvalidPattern(id) => write!(f, "element `{id}`: pattern does not compile"),
            Self::InvalidCustomValidation(id) => {
                write!(f, "element `{id}`: custom validation does not parse")
            }
            Self::UnknownRuleElement { rule, element_id } => write!(
                f,
                "cross-field rule `{rule}` references missing element `{element_id}`"
            ),
        }
    }
}

impl Error for DefinitionConfigError {}

/// Checks `definition` and `rules` for configuration mistakes.
///
/// Returns the first problem in element order, then rule order.
///
/// # Errors
/// - `DefinitionConfigError` describing the first problem found.
pub fn check_definition(
    definition: &FormDefinition,
    rules: &[CrossFieldRule],
) -> Result<(), DefinitionConfigError> {
    let mut seen = HashSet::with_capacity(definition.elements.len());
    for element in &definition.elements {
        let element_id = element.id;
        if !seen.insert(element_id) {
            return Err(DefinitionConfigError::DuplicateElementId(element_id));
        }
        if let (Some(min_length), Some(max_length)) = (element.min_length, element.max_length) {
            if max_length <= min_length {
                return Err(DefinitionConfigError::LengthBounds {
                    element_id,
                    min_length,
                    max_length,
                });
            }
        }
        if let (Some(min), Some(max)) = (element.min, element.max) {
            if max <= min {
                return Err(DefinitionConfigError::ValueBounds {
                    element_id,
                    min,
                    max,
                });
            }
        }
        if let Some(step) = element.step {
            if step <= 0.0 || !step.is_finite() {
                return Err(DefinitionConfigError::NonPositiveStep { element_id, step });
            }
        }
        if let Some(rows) = element.rows {
            if !ROWS_RANGE.contains(&rows) {
                return Err(DefinitionConfigError::RowsOutOfRange { element_id, rows });
            }
        }
        if let Some(pattern) = element.pattern.as_deref().filter(|p| !p.is_empty()) {
            if compile_pattern(pattern).is_err() {
                return Err(DefinitionConfigError::InvalidPattern(element_id));
            }
        }
        if let Some(source) = element
            .custom_validation
            .as_deref()
            .filter(|source| !source.trim().is_empty())
        {
            if CompiledRule::compile(source).is_err() {
                return Err(DefinitionConfigError::InvalidCustomValidation(element_id));
            }
        }
    }

    for rule in rules {
        for element_id in rule.named_ids() {
            if !seen.contains(&element_id) {
                return Err(DefinitionConfigError::UnknownRuleElement {
                    rule: rule.name.clone(),
                    element_id,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_definition, DefinitionConfigError};
    use crate::model::definition::FormDefinition;
    use crate::model::element::FormElement;
    use crate::model::kind::ElementKind;
    use crate::validation::cross_field::CrossFieldRule;
    use uuid::Uuid;

    #[test]
    fn default_elements_pass() {
        let mut definition = FormDefinition::new("defaults");
        definition.elements = ElementKind::all()
            .iter()
            .map(|kind| FormElement::create_default(*kind))
            .collect();
        assert_eq!(check_definition(&definition, &[]), Ok(()));
    }

    #[test]
    fn inverted_length_bounds_are_rejected() {
        let mut definition = FormDefinition::new("bounds");
        let mut element = FormElement::create_default(ElementKind::Text);
        element.min_length = Some(10);
        element.max_length = Some(10);
        definition.elements.push(element);
        assert!(matches!(
            check_definition(&definition, &[]),
            Err(DefinitionConfigError::LengthBounds { .. })
        ));
    }

    #[test]
    fn rule_referencing_missing_element_is_rejected() {
        let mut definition = FormDefinition::new("rules");
        let element = FormElement::create_default(ElementKind::Text);
        let rule = CrossFieldRule::must_equal("confirm", element.id, Uuid::new_v4(), "mismatch");
        definition.elements.push(element);
        assert!(matches!(
            check_definition(&definition, &[rule]),
            Err(DefinitionConfigError::UnknownRuleElement { .. })
        ));
    }

    #[test]
    fn broken_pattern_and_rule_are_rejected() {
        let mut definition = FormDefinition::new("broken");
        let mut element = FormElement::create_default(ElementKind::Text);
        element.pattern = Some("([a-z".to_string());
        definition.elements.push(element.clone());
        assert!(matches!(
            check_definition(&definition, &[]),
            Err(DefinitionConfigError::InvalidPattern(_))
        ));

        element.pattern = None;
        element.custom_validation = Some("value >".to_string());
        definition.elements = vec![element];
        assert!(matches!(
            check_definition(&definition, &[]),
            Err(DefinitionConfigError::InvalidCustomValidation(_))
        ));
    }
}
