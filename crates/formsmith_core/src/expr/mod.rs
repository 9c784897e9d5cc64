//! Sandboxed interpreter for user-authored validation rules.
//!
//! # Responsibility
//! - Parse the restricted rule grammar (comparisons, boolean connectives,
//!   arithmetic, field references) into a tagged AST.
//! - Evaluate the AST against a value context under step and time budgets.
//!
//! # Invariants
//! - No host code is ever executed: there are no call, member or loop nodes.
//! - Every failure (lex, parse, unknown identifier, type error, budget) maps
//!   to `InvalidExpressionError`, whose message never varies.
//! - Fault details are logged as reason codes only, never the rule source.

use crate::config::EngineConfig;
use crate::model::element::FieldValue;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

mod eval;
mod lexer;
mod parser;

pub use parser::{ArithOp, CompareOp, Expr, Literal, LogicOp};

/// The only message surfaced for a broken rule.
pub const INVALID_EXPRESSION_MESSAGE: &str = "Invalid custom validation rule";
/// Maximum rule length in characters.
pub const MAX_EXPRESSION_CHARS: usize = 500;

/// Generic, non-leaking rule failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidExpressionError;

impl Display for InvalidExpressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(INVALID_EXPRESSION_MESSAGE)
    }
}

impl Error for InvalidExpressionError {}

/// Internal fault classification, used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprFault {
    Empty,
    TooLong,
    Lex,
    Parse,
    TooDeep,
    UnknownIdentifier,
    Type,
    DivisionByZero,
    StepBudget,
    TimeBudget,
    Panicked,
}

impl ExprFault {
    fn code(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooLong => "too_long",
            Self::Lex => "lex",
            Self::Parse => "parse",
            Self::TooDeep => "too_deep",
            Self::UnknownIdentifier => "unknown_identifier",
            Self::Type => "type",
            Self::DivisionByZero => "division_by_zero",
            Self::StepBudget => "step_budget",
            Self::TimeBudget => "time_budget",
            Self::Panicked => "panicked",
        }
    }

    fn reject(self) -> InvalidExpressionError {
        debug!(
            "event=custom_rule_rejected module=expr status=rejected reason={}",
            self.code()
        );
        InvalidExpressionError
    }
}

/// Execution bounds for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    pub step_budget: u32,
    pub time_budget: Duration,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EvalLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            step_budget: config.expression_step_budget.max(1),
            time_budget: config.expression_time_budget(),
        }
    }
}

/// Values visible to a rule: `value` plus siblings by binding name.
#[derive(Debug, Clone, Copy)]
pub struct ValueContext<'a> {
    pub current: &'a FieldValue,
    pub siblings: &'a BTreeMap<String, FieldValue>,
}

/// A parsed rule, reusable across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    ast: Expr,
}

impl CompiledRule {
    /// Parses `source` into a rule.
    ///
    /// # Errors
    /// - `InvalidExpressionError` for empty, overlong, malformed or too deeply
    ///   nested sources.
    pub fn compile(source: &str) -> Result<Self, InvalidExpressionError> {
        Self::compile_inner(source).map_err(ExprFault::reject)
    }

    fn compile_inner(source: &str) -> Result<Self, ExprFault> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(ExprFault::Empty);
        }
        if trimmed.chars().count() > MAX_EXPRESSION_CHARS {
            return Err(ExprFault::TooLong);
        }
        let tokens = lexer::tokenize(trimmed)?;
        let ast = parser::parse(tokens)?;
        Ok(Self { ast })
    }

    /// Evaluates the rule; `Ok(true)` means the value passes.
    ///
    /// # Errors
    /// - `InvalidExpressionError` on unknown identifiers, type errors,
    ///   division by zero, or when a budget is exhausted.
    pub fn evaluate(
        &self,
        ctx: &ValueContext<'_>,
        limits: EvalLimits,
    ) -> Result<bool, InvalidExpressionError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            eval::Interpreter::new(ctx, limits).run(&self.ast)
        }));
        match outcome {
            Ok(Ok(passed)) => Ok(passed),
            Ok(Err(fault)) => Err(fault.reject()),
            Err(_) => Err(ExprFault::Panicked.reject()),
        }
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Sibling binding names referenced by the rule (excluding `value`).
    pub fn referenced_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_names(&self.ast, &mut names);
        names
    }
}

/// Compiles and evaluates `source` in one call.
pub fn evaluate(
    source: &str,
    ctx: &ValueContext<'_>,
    limits: EvalLimits,
) -> Result<bool, InvalidExpressionError> {
    CompiledRule::compile(source)?.evaluate(ctx, limits)
}

fn collect_names(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Field(name) => {
            if name != "value" {
                names.insert(name.clone());
            }
        }
        Expr::Not(inner) | Expr::Negate(inner) => collect_names(inner, names),
        Expr::Arith { lhs, rhs, .. }
        | Expr::Compare { lhs, rhs, .. }
        | Expr::Logic { lhs, rhs, .. } => {
            collect_names(lhs, names);
            collect_names(rhs, names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate, CompiledRule, EvalLimits, InvalidExpressionError, ValueContext};
    use crate::model::element::FieldValue;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn run(source: &str, current: FieldValue) -> Result<bool, InvalidExpressionError> {
        let siblings = BTreeMap::new();
        let ctx = ValueContext {
            current: &current,
            siblings: &siblings,
        };
        evaluate(source, &ctx, EvalLimits::default())
    }

    #[test]
    fn referenced_names_skip_current_value() {
        let rule = CompiledRule::compile("value == password && age >= 18").unwrap();
        let names: Vec<String> = rule.referenced_names().into_iter().collect();
        assert_eq!(names, vec!["age".to_string(), "password".to_string()]);
    }

    #[test]
    fn step_budget_is_enforced() {
        let siblings = BTreeMap::new();
        let current = FieldValue::Number(1.0);
        let ctx = ValueContext {
            current: &current,
            siblings: &siblings,
        };
        let limits = EvalLimits {
            step_budget: 3,
            time_budget: Duration::from_secs(1),
        };
        let rule = CompiledRule::compile("value + 1 + 1 + 1 > 0").unwrap();
        assert_eq!(rule.evaluate(&ctx, limits), Err(InvalidExpressionError));
    }

    #[test]
    fn overlong_source_is_rejected() {
        let source = format!("value == '{}'", "x".repeat(600));
        assert_eq!(run(&source, FieldValue::empty()), Err(InvalidExpressionError));
    }

    #[test]
    fn error_message_is_fixed() {
        assert_eq!(
            InvalidExpressionError.to_string(),
            "Invalid custom validation rule"
        );
    }
}
