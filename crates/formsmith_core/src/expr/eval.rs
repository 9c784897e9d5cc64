//! Bounded AST interpreter.

use crate::expr::parser::{ArithOp, CompareOp, Expr, Literal, LogicOp};
use crate::expr::{EvalLimits, ExprFault, ValueContext};
use crate::model::element::FieldValue;
use std::cmp::Ordering;
use std::time::Instant;

/// Steps between wall-clock checks.
const CLOCK_CHECK_INTERVAL: u32 = 32;
const CURRENT_VALUE_IDENT: &str = "value";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprValue {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl ExprValue {
    fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Null => false,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Str(s) => s.trim().parse::<f64>().ok(),
            Self::Bool(_) | Self::Null => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }
}

impl From<&FieldValue> for ExprValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Bool(b) => Self::Bool(*b),
            FieldValue::Number(n) => Self::Number(*n),
            FieldValue::Text(s) => Self::Str(s.clone()),
        }
    }
}

pub(crate) struct Interpreter<'a> {
    ctx: &'a ValueContext<'a>,
    steps: u32,
    started: Instant,
    limits: EvalLimits,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(ctx: &'a ValueContext<'a>, limits: EvalLimits) -> Self {
        Self {
            ctx,
            steps: 0,
            started: Instant::now(),
            limits,
        }
    }

    pub(crate) fn run(&mut self, expr: &Expr) -> Result<bool, ExprFault> {
        Ok(self.eval(expr)?.truthy())
    }

    fn tick(&mut self) -> Result<(), ExprFault> {
        self.steps += 1;
        if self.steps > self.limits.step_budget {
            return Err(ExprFault::StepBudget);
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 && self.started.elapsed() > self.limits.time_budget
        {
            return Err(ExprFault::TimeBudget);
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<ExprValue, ExprFault> {
        self.tick()?;
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Number(n) => ExprValue::Number(*n),
                Literal::Str(s) => ExprValue::Str(s.clone()),
                Literal::Bool(b) => ExprValue::Bool(*b),
                Literal::Null => ExprValue::Null,
            }),
            Expr::Field(name) => self.lookup(name),
            Expr::Not(inner) => Ok(ExprValue::Bool(!self.eval(inner)?.truthy())),
            Expr::Negate(inner) => {
                let value = self.eval(inner)?;
                let number = value.as_number().ok_or(ExprFault::Type)?;
                Ok(ExprValue::Number(-number))
            }
            Expr::Logic { op, lhs, rhs } => {
                let left = self.eval(lhs)?.truthy();
                let result = match op {
                    LogicOp::And => left && self.eval(rhs)?.truthy(),
                    LogicOp::Or => left || self.eval(rhs)?.truthy(),
                };
                Ok(ExprValue::Bool(result))
            }
            Expr::Compare { op, lhs, rhs } => {
                let left = self.eval(lhs)?;
                let right = self.eval(rhs)?;
                compare(*op, &left, &right).map(ExprValue::Bool)
            }
            Expr::Arith { op, lhs, rhs } => {
                let left = self.eval(lhs)?;
                let right = self.eval(rhs)?;
                arith(*op, &left, &right)
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<ExprValue, ExprFault> {
        if name == CURRENT_VALUE_IDENT {
            return Ok(ExprValue::from(self.ctx.current));
        }
        self.ctx
            .siblings
            .get(name)
            .map(ExprValue::from)
            .ok_or(ExprFault::UnknownIdentifier)
    }
}

fn compare(op: CompareOp, left: &ExprValue, right: &ExprValue) -> Result<bool, ExprFault> {
    match op {
        CompareOp::Eq => Ok(loose_equals(left, right)),
        CompareOp::NotEq => Ok(!loose_equals(left, right)),
        CompareOp::StrictEq => Ok(left == right),
        CompareOp::StrictNotEq => Ok(left != right),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = order(left, right)?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn loose_equals(left: &ExprValue, right: &ExprValue) -> bool {
    match (left, right) {
        (ExprValue::Null, ExprValue::Null) => true,
        (ExprValue::Str(a), ExprValue::Str(b)) => a == b,
        (ExprValue::Bool(a), ExprValue::Bool(b)) => a == b,
        (ExprValue::Number(_), ExprValue::Number(_) | ExprValue::Str(_))
        | (ExprValue::Str(_), ExprValue::Number(_)) => {
            match (left.as_number(), right.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => false,
    }
}

fn order(left: &ExprValue, right: &ExprValue) -> Result<Ordering, ExprFault> {
    match (left, right) {
        (ExprValue::Str(a), ExprValue::Str(b)) => Ok(a.cmp(b)),
        (ExprValue::Number(_) | ExprValue::Str(_), ExprValue::Number(_) | ExprValue::Str(_)) => {
            let a = left.as_number().ok_or(ExprFault::Type)?;
            let b = right.as_number().ok_or(ExprFault::Type)?;
            a.partial_cmp(&b).ok_or(ExprFault::Type)
        }
        _ => Err(ExprFault::Type),
    }
}

fn arith(op: ArithOp, left: &ExprValue, right: &ExprValue) -> Result<ExprValue, ExprFault> {
    if op == ArithOp::Add
        && (matches!(left, ExprValue::Str(_)) || matches!(right, ExprValue::Str(_)))
    {
        return Ok(ExprValue::Str(format!("{}{}", left.render(), right.render())));
    }

    let a = left.as_number().ok_or(ExprFault::Type)?;
    let b = right.as_number().ok_or(ExprFault::Type)?;
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div | ArithOp::Rem if b == 0.0 => return Err(ExprFault::DivisionByZero),
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
    };
    if !result.is_finite() {
        return Err(ExprFault::Type);
    }
    Ok(ExprValue::Number(result))
}

#[cfg(test)]
mod tests {
    use super::{arith, compare, ExprValue};
    use crate::expr::parser::{ArithOp, CompareOp};
    use crate::expr::ExprFault;

    #[test]
    fn numeric_strings_compare_numerically() {
        let left = ExprValue::Str("15".to_string());
        let right = ExprValue::Number(18.0);
        assert_eq!(compare(CompareOp::Gt, &left, &right), Ok(false));
        assert_eq!(compare(CompareOp::Eq, &ExprValue::Str("18".to_string()), &right), Ok(true));
    }

    #[test]
    fn strict_equality_requires_matching_types() {
        let text = ExprValue::Str("18".to_string());
        let number = ExprValue::Number(18.0);
        assert_eq!(compare(CompareOp::StrictEq, &text, &number), Ok(false));
        assert_eq!(compare(CompareOp::StrictNotEq, &text, &number), Ok(true));
        assert_eq!(compare(CompareOp::StrictEq, &number, &ExprValue::Number(18.0)), Ok(true));
    }

    #[test]
    fn ordering_booleans_is_a_type_error() {
        let result = compare(CompareOp::Lt, &ExprValue::Bool(true), &ExprValue::Number(1.0));
        assert_eq!(result, Err(ExprFault::Type));
    }

    #[test]
    fn plus_concatenates_when_a_string_is_involved() {
        let result = arith(
            ArithOp::Add,
            &ExprValue::Str("id-".to_string()),
            &ExprValue::Number(7.0),
        );
        assert_eq!(result, Ok(ExprValue::Str("id-7".to_string())));
    }

    #[test]
    fn division_by_zero_faults() {
        let result = arith(ArithOp::Rem, &ExprValue::Number(4.0), &ExprValue::Number(0.0));
        assert_eq!(result, Err(ExprFault::DivisionByZero));
    }
}
