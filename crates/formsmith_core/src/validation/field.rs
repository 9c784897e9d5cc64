//! Single-field validation pipeline.
//!
//! Order: structure, required, range/length/pattern, custom rule. The first
//! failing stage decides the result.

use crate::expr::{CompiledRule, EvalLimits, ValueContext, INVALID_EXPRESSION_MESSAGE};
use crate::model::element::{FieldValue, FormElement};
use crate::model::kind::KindFamily;
use crate::validation::FieldResult;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

pub const REQUIRED_MESSAGE: &str = "required";
pub const CUSTOM_RULE_FAILED_MESSAGE: &str = "Custom validation failed";
pub const PATTERN_MISMATCH_MESSAGE: &str = "Input format is invalid";

pub(crate) const MAX_CONTENT_CHARS: usize = 500;
pub(crate) const MAX_PLACEHOLDER_CHARS: usize = 100;
pub(crate) const MAX_HELP_TEXT_CHARS: usize = 200;
const STEP_TOLERANCE: f64 = 1e-9;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex"));
static REGEX_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(.*)/([a-z]*)$").expect("valid regex-literal regex"));

/// Runs stages 1 to 4 for one field element.
pub(crate) fn validate_field(
    element: &FormElement,
    value: &FieldValue,
    siblings: &BTreeMap<String, FieldValue>,
    limits: EvalLimits,
) -> FieldResult {
    if let Err(message) = check_structure(element, value) {
        return FieldResult::invalid(message);
    }
    if element.required && !satisfies_required(element, value) {
        return FieldResult::invalid(REQUIRED_MESSAGE);
    }
    // Optional fields left blank skip constraint and rule stages.
    if value.is_blank() {
        return FieldResult::valid();
    }
    if let Err(message) = check_constraints(element, value) {
        return FieldResult::invalid(message);
    }
    if let Some(source) = element.custom_validation.as_deref() {
        if !source.trim().is_empty() {
            let ctx = ValueContext {
                current: value,
                siblings,
            };
            return match CompiledRule::compile(source).and_then(|rule| rule.evaluate(&ctx, limits)) {
                Ok(true) => FieldResult::valid(),
                Ok(false) => FieldResult::invalid(CUSTOM_RULE_FAILED_MESSAGE),
                Err(_) => FieldResult::invalid(INVALID_EXPRESSION_MESSAGE),
            };
        }
    }
    FieldResult::valid()
}

fn check_structure(element: &FormElement, value: &FieldValue) -> Result<(), String> {
    if element.content.chars().count() > MAX_CONTENT_CHARS {
        return Err("Content too long".to_string());
    }
    if element.placeholder.chars().count() > MAX_PLACEHOLDER_CHARS {
        return Err("Placeholder too long".to_string());
    }
    if element.help_text.chars().count() > MAX_HELP_TEXT_CHARS {
        return Err("Help text too long".to_string());
    }
    if element
        .custom_validation
        .as_deref()
        .is_some_and(|source| source.chars().count() > crate::expr::MAX_EXPRESSION_CHARS)
    {
        return Err("Validation code too long".to_string());
    }

    match (element.kind.family(), value) {
        (KindFamily::Toggle, FieldValue::Bool(_)) => Ok(()),
        (KindFamily::Toggle, _) => Err("Value must be true or false".to_string()),
        (_, FieldValue::Bool(_)) => Err("Invalid value type".to_string()),
        (KindFamily::Text, FieldValue::Text(_)) => Ok(()),
        (KindFamily::Text, FieldValue::Number(_)) => Err("Invalid value type".to_string()),
        (KindFamily::Numeric, FieldValue::Number(n)) if n.is_finite() => Ok(()),
        (KindFamily::Numeric, FieldValue::Text(text)) if text.trim().is_empty() => Ok(()),
        (KindFamily::Numeric, FieldValue::Text(text))
            if text.trim().parse::<f64>().is_ok_and(f64::is_finite) =>
        {
            Ok(())
        }
        (KindFamily::Numeric, _) => Err("Value must be a number".to_string()),
        (KindFamily::Choice, FieldValue::Text(text)) => {
            if text.is_empty() || element.options.iter().any(|option| option == text) {
                Ok(())
            } else {
                Err("Value must be one of the available options".to_string())
            }
        }
        (KindFamily::Choice, _) => Err("Invalid value type".to_string()),
        (KindFamily::Temporal, FieldValue::Text(text)) => {
            if text.is_empty() || ISO_DATE_RE.is_match(text) {
                Ok(())
            } else {
                Err("Date must use YYYY-MM-DD".to_string())
            }
        }
        (KindFamily::Temporal, _) => Err("Invalid value type".to_string()),
        (KindFamily::Action | KindFamily::Layout | KindFamily::Widget, _) => Ok(()),
    }
}

fn satisfies_required(element: &FormElement, value: &FieldValue) -> bool {
    match (element.kind.family(), value) {
        (KindFamily::Toggle, FieldValue::Bool(checked)) => *checked,
        (_, other) => !other.is_blank(),
    }
}

fn check_constraints(element: &FormElement, value: &FieldValue) -> Result<(), String> {
    match element.kind.family() {
        KindFamily::Text => {
            let FieldValue::Text(text) = value else {
                return Ok(());
            };
            let length = text.chars().count();
            if let Some(min_length) = element.min_length {
                if length < min_length as usize {
                    return Err(format!("Input must be at least {min_length} characters"));
                }
            }
            if let Some(max_length) = element.max_length {
                if length > max_length as usize {
                    return Err(format!(
                        "Input must be no more than {max_length} characters"
                    ));
                }
            }
            if let Some(pattern) = element.pattern.as_deref().filter(|p| !p.is_empty()) {
                let matched = compile_pattern(pattern)
                    .map(|re| re.is_match(text))
                    .unwrap_or(false);
                if !matched {
                    return Err(PATTERN_MISMATCH_MESSAGE.to_string());
                }
            }
            Ok(())
        }
        KindFamily::Numeric => {
            let Some(number) = numeric_value(value) else {
                return Ok(());
            };
            if let Some(min) = element.min {
                if number < min {
                    return Err(format!("Value must be at least {min}"));
                }
            }
            if let Some(max) = element.max {
                if number > max {
                    return Err(format!("Value must be no more than {max}"));
                }
            }
            if let Some(step) = element.step.filter(|step| *step > 0.0) {
                let base = element.min.unwrap_or(0.0);
                let ratio = (number - base) / step;
                if (ratio - ratio.round()).abs() > STEP_TOLERANCE {
                    return Err(format!("Value must be a multiple of {step}"));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

pub(crate) fn numeric_value(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        FieldValue::Bool(_) => None,
    }
}

/// Compiles a user pattern, accepting `/body/flags` literals.
///
/// Matching follows search semantics: the pattern may match anywhere unless
/// it carries its own anchors.
pub(crate) fn compile_pattern(raw: &str) -> Result<Regex, regex::Error> {
    let (body, flags) = match REGEX_LITERAL_RE.captures(raw) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()).to_string(),
            caps.get(2).map_or("", |m| m.as_str()).to_string(),
        ),
        None => (raw.to_string(), String::new()),
    };
    let mut builder = RegexBuilder::new(&body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // `g`, `u` and `y` have no effect on a single boolean test.
            _ => {}
        }
    }
    builder.size_limit(1 << 20).build()
}

#[cfg(test)]
mod tests {
    use super::{compile_pattern, validate_field, REQUIRED_MESSAGE};
    use crate::expr::EvalLimits;
    use crate::model::element::{FieldValue, FormElement};
    use crate::model::kind::ElementKind;
    use std::collections::BTreeMap;

    fn check(element: &FormElement, value: FieldValue) -> (bool, Option<String>) {
        let result = validate_field(element, &value, &BTreeMap::new(), EvalLimits::default());
        (result.valid, result.message)
    }

    #[test]
    fn regex_literal_flags_are_honored() {
        let re = compile_pattern("/^abc$/i").unwrap();
        assert!(re.is_match("ABC"));
        assert!(compile_pattern("[a-z").is_err());
    }

    #[test]
    fn required_checkbox_must_be_checked() {
        let mut element = FormElement::create_default(ElementKind::Checkbox);
        element.required = true;
        assert_eq!(
            check(&element, FieldValue::Bool(false)),
            (false, Some(REQUIRED_MESSAGE.to_string()))
        );
        assert_eq!(check(&element, FieldValue::Bool(true)), (true, None));
    }

    #[test]
    fn numeric_step_is_relative_to_min() {
        let mut element = FormElement::create_default(ElementKind::Number);
        element.min = Some(1.0);
        element.step = Some(2.0);
        assert!(check(&element, FieldValue::Number(5.0)).0);
        assert!(!check(&element, FieldValue::Number(4.0)).0);
    }

    #[test]
    fn numeric_strings_are_accepted_for_number_kinds() {
        let mut element = FormElement::create_default(ElementKind::Number);
        element.max = Some(10.0);
        assert!(check(&element, FieldValue::Text("7".to_string())).0);
        assert_eq!(
            check(&element, FieldValue::Text("abc".to_string())),
            (false, Some("Value must be a number".to_string()))
        );
    }

    #[test]
    fn choice_value_must_be_listed() {
        let element = FormElement::create_default(ElementKind::Select);
        assert!(check(&element, FieldValue::Text("Option 2".to_string())).0);
        assert!(!check(&element, FieldValue::Text("Option 9".to_string())).0);
    }

    #[test]
    fn blank_optional_field_skips_custom_rule() {
        let mut element = FormElement::create_default(ElementKind::Text);
        element.custom_validation = Some("value > 18".to_string());
        assert_eq!(check(&element, FieldValue::empty()), (true, None));
    }

    #[test]
    fn date_shape_is_checked() {
        let element = FormElement::create_default(ElementKind::Date);
        assert!(check(&element, FieldValue::Text("2026-10-19".to_string())).0);
        assert!(!check(&element, FieldValue::Text("19/10/2026".to_string())).0);
    }
}
