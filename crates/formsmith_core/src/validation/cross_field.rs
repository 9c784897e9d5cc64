//! Named rules that relate two or more fields.

use crate::expr::{CompiledRule, EvalLimits, ValueContext, INVALID_EXPRESSION_MESSAGE};
use crate::model::definition::FormDefinition;
use crate::model::element::{ElementId, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a cross-field rule checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CrossFieldCheck {
    /// Target value must equal the value of `other` (e.g. password confirm).
    MustEqual { other: ElementId },
    /// Expression evaluated with `value` bound to the target.
    Expression { expression: String },
}

/// A registered cross-field rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossFieldRule {
    pub name: String,
    pub target: ElementId,
    #[serde(default)]
    pub depends_on: Vec<ElementId>,
    pub check: CrossFieldCheck,
    pub message: String,
}

impl CrossFieldRule {
    pub fn must_equal(
        name: impl Into<String>,
        target: ElementId,
        other: ElementId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            depends_on: vec![other],
            check: CrossFieldCheck::MustEqual { other },
            message: message.into(),
        }
    }

    pub fn expression(
        name: impl Into<String>,
        target: ElementId,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            depends_on: Vec::new(),
            check: CrossFieldCheck::Expression {
                expression: expression.into(),
            },
            message: message.into(),
        }
    }

    /// Every element id this rule reads, excluding the target.
    ///
    /// Expression rules also depend on the elements whose binding names
    /// they reference in `definition`.
    pub fn dependencies(&self, definition: &FormDefinition) -> BTreeSet<ElementId> {
        let mut ids: BTreeSet<ElementId> = self.depends_on.iter().copied().collect();
        match &self.check {
            CrossFieldCheck::MustEqual { other } => {
                ids.insert(*other);
            }
            CrossFieldCheck::Expression { expression } => {
                if let Ok(rule) = CompiledRule::compile(expression) {
                    let names = rule.referenced_names();
                    ids.extend(
                        definition
                            .elements
                            .iter()
                            .filter(|element| {
                                element
                                    .binding_name()
                                    .is_some_and(|name| names.contains(name))
                            })
                            .map(|element| element.id),
                    );
                }
            }
        }
        ids.remove(&self.target);
        ids
    }

    /// Every id the rule names explicitly (target, `depends_on`, `other`).
    pub(crate) fn named_ids(&self) -> Vec<ElementId> {
        let mut ids = vec![self.target];
        ids.extend(self.depends_on.iter().copied());
        if let CrossFieldCheck::MustEqual { other } = &self.check {
            ids.push(*other);
        }
        ids
    }

    /// Evaluates the rule; `Err` carries the failure message.
    pub(crate) fn evaluate(
        &self,
        definition: &FormDefinition,
        siblings: &BTreeMap<String, FieldValue>,
        limits: EvalLimits,
    ) -> Result<(), String> {
        let Some(target) = definition.element(self.target) else {
            return Err(self.message.clone());
        };
        let current = target.value();
        match &self.check {
            CrossFieldCheck::MustEqual { other } => {
                let other_value = definition
                    .element(*other)
                    .map(|element| element.value())
                    .ok_or_else(|| self.message.clone())?;
                if values_equal(&current, &other_value) {
                    Ok(())
                } else {
                    Err(self.message.clone())
                }
            }
            CrossFieldCheck::Expression { expression } => {
                let ctx = ValueContext {
                    current: &current,
                    siblings,
                };
                match crate::expr::evaluate(expression, &ctx, limits) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(self.message.clone()),
                    Err(_) => Err(INVALID_EXPRESSION_MESSAGE.to_string()),
                }
            }
        }
    }
}

fn values_equal(left: &FieldValue, right: &FieldValue) -> bool {
    match (left, right) {
        (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
        _ => left.to_string() == right.to_string(),
    }
}
