//! Form validator: single-field pipeline plus cross-field rules.

use crate::config::EngineConfig;
use crate::expr::EvalLimits;
use crate::model::definition::FormDefinition;
use crate::model::element::{ElementId, FieldValue, FormElement};
use crate::validation::cross_field::CrossFieldRule;
use crate::validation::field::validate_field;
use crate::validation::{FieldResult, ValidationReport, ValidationTarget};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Validates definitions against their field constraints and the
/// registered cross-field rules.
#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    rules: Vec<CrossFieldRule>,
    limits: EvalLimits,
}

impl FormValidator {
    pub fn new(limits: EvalLimits) -> Self {
        Self {
            rules: Vec::new(),
            limits,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(EvalLimits::from(config))
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    pub fn rules(&self) -> &[CrossFieldRule] {
        &self.rules
    }

    /// Registers `rule`, replacing any rule with the same name.
    pub fn add_rule(&mut self, rule: CrossFieldRule) {
        self.rules.retain(|existing| existing.name != rule.name);
        self.rules.push(rule);
    }

    /// Removes the rule named `name`; returns whether one existed.
    pub fn remove_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name != name);
        self.rules.len() != before
    }

    /// Validates `target` within `definition`.
    ///
    /// Unknown ids and non-field elements produce an empty report.
    pub fn validate(&self, definition: &FormDefinition, target: ValidationTarget) -> ValidationReport {
        let siblings = sibling_values(definition);
        let scope: Vec<ElementId> = match target {
            ValidationTarget::All => field_ids(definition),
            ValidationTarget::Element(id) => match definition.element(id) {
                Some(element) if element.kind.is_field() => vec![id],
                _ => Vec::new(),
            },
        };

        // Single-field results for the scope plus every rule dependency.
        let mut needed: BTreeSet<ElementId> = scope.iter().copied().collect();
        for rule in self.rules_for(&scope) {
            needed.extend(rule.dependencies(definition));
        }
        let mut results: BTreeMap<ElementId, FieldResult> = needed
            .iter()
            .filter_map(|id| definition.element(*id))
            .filter(|element| element.kind.is_field())
            .map(|element| (element.id, self.single(element, &siblings)))
            .collect();

        let single_pass: BTreeMap<ElementId, bool> = results
            .iter()
            .map(|(id, result)| (*id, result.valid))
            .collect();
        for rule in self.rules_for(&scope) {
            let dependencies = rule.dependencies(definition);
            let ready = single_pass.get(&rule.target).copied().unwrap_or(false)
                && dependencies
                    .iter()
                    .all(|id| single_pass.get(id).copied().unwrap_or(false));
            if !ready {
                continue;
            }
            let Some(entry) = results.get_mut(&rule.target) else {
                continue;
            };
            if !entry.valid {
                continue;
            }
            if let Err(message) = rule.evaluate(definition, &siblings, self.limits) {
                debug!(
                    "event=cross_field_failed module=validation status=rejected target={}",
                    rule.target
                );
                *entry = FieldResult::invalid(message);
            }
        }

        results.retain(|id, _| scope.contains(id));
        ValidationReport::new(results)
    }

    fn single(&self, element: &FormElement, siblings: &BTreeMap<String, FieldValue>) -> FieldResult {
        validate_field(element, &element.value(), siblings, self.limits)
    }

    fn rules_for<'a>(&'a self, scope: &'a [ElementId]) -> impl Iterator<Item = &'a CrossFieldRule> {
        self.rules.iter().filter(move |rule| scope.contains(&rule.target))
    }
}

fn field_ids(definition: &FormDefinition) -> Vec<ElementId> {
    definition
        .elements
        .iter()
        .filter(|element| element.kind.is_field())
        .map(|element| element.id)
        .collect()
}

/// Values of every named field, keyed by binding name.
///
/// When two fields share a name the first one in list order wins.
pub(crate) fn sibling_values(definition: &FormDefinition) -> BTreeMap<String, FieldValue> {
    let mut values = BTreeMap::new();
    for element in definition.elements.iter().filter(|e| e.kind.is_field()) {
        if let Some(name) = element.binding_name() {
            values
                .entry(name.to_string())
                .or_insert_with(|| element.value());
        }
    }
    values
}
