//! Recursive-descent parser producing the rule AST.
//!
//! Precedence, lowest first: `||`, `&&`, equality, relational, additive,
//! multiplicative, unary, primary.

use crate::expr::lexer::Token;
use crate::expr::ExprFault;

/// Maximum nesting depth of parentheses and unary chains.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`: numeric strings equal their numbers.
    Eq,
    NotEq,
    /// `===`: operands must also share a type.
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Rule AST. Only these node kinds exist; there is no call or member node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// `value` or a sibling field's binding name.
    Field(String),
    Not(Box<Expr>),
    Negate(Box<Expr>),
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logic {
        op: LogicOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

pub(crate) fn parse(tokens: Vec<Token>) -> Result<Expr, ExprFault> {
    if tokens.is_empty() {
        return Err(ExprFault::Parse);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprFault::Parse);
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), ExprFault> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprFault::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_or(&mut self) -> Result<Expr, ExprFault> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Logic {
                op: LogicOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprFault> {
        let mut lhs = self.parse_equality()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.pos += 1;
            let rhs = self.parse_equality()?;
            lhs = Expr::Logic {
                op: LogicOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprFault> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                Some(Token::StrictEq) => CompareOp::StrictEq,
                Some(Token::StrictNotEq) => CompareOp::StrictNotEq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_relational()?;
            lhs = Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, ExprFault> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprFault> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprFault> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                Some(Token::Percent) => ArithOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprFault> {
        match self.peek() {
            Some(Token::Bang) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(Expr::Not(Box::new(inner)))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(Expr::Negate(Box::new(inner)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprFault> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Literal(Literal::Number(value))),
            Some(Token::Str(value)) => Ok(Expr::Literal(Literal::Str(value))),
            Some(Token::True) => Ok(Expr::Literal(Literal::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Literal::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Literal::Null)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    // Function calls are not part of the grammar.
                    return Err(ExprFault::Parse);
                }
                Ok(Expr::Field(name))
            }
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.leave();
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExprFault::Parse),
                }
            }
            _ => Err(ExprFault::Parse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, ArithOp, CompareOp, Expr, Literal, LogicOp};
    use crate::expr::lexer::tokenize;
    use crate::expr::ExprFault;

    fn parse_str(source: &str) -> Result<Expr, ExprFault> {
        parse(tokenize(source)?)
    }

    #[test]
    fn multiplication_binds_tighter_than_comparison() {
        let expr = parse_str("value * 2 > 10").unwrap();
        let Expr::Compare { op, lhs, .. } = expr else {
            panic!("expected comparison root");
        };
        assert_eq!(op, CompareOp::Gt);
        assert!(matches!(*lhs, Expr::Arith { op: ArithOp::Mul, .. }));
    }

    #[test]
    fn or_is_the_loosest_operator() {
        let expr = parse_str("a && b || c").unwrap();
        assert!(matches!(expr, Expr::Logic { op: LogicOp::Or, .. }));
    }

    #[test]
    fn literals_parse() {
        assert_eq!(
            parse_str("null").unwrap(),
            Expr::Literal(Literal::Null)
        );
    }

    #[test]
    fn rejects_calls_and_dangling_operators() {
        assert_eq!(parse_str("alert(1)"), Err(ExprFault::Parse));
        assert_eq!(parse_str("value >"), Err(ExprFault::Parse));
        assert_eq!(parse_str("(value > 1"), Err(ExprFault::Parse));
        assert_eq!(parse_str("value 1"), Err(ExprFault::Parse));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse_str(&source), Err(ExprFault::TooDeep));
    }
}
