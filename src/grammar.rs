//! Operator table for the shift-reduce expression engine.
//!
//! Levels, lowest first: assignment (right), `and`/`or` (left), `==`/`!=`
//! (left), relational (non-associative), additive (left), multiplicative
//! (left), `^` (left), unary minus (right). Assignment and unary minus are
//! prefix forms handled while reading an operand, so only the binary levels
//! live in the table.

use crate::ast::BinaryOperator;
use crate::lexer::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    NonAssoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub level: u8,
    pub assoc: Assoc,
}

/// Precedence of a binary operator.
pub fn precedence(operator: BinaryOperator) -> Precedence {
    use BinaryOperator::*;

    let (level, assoc) = match operator {
        And | Or => (2, Assoc::Left),
        Equal | NotEqual => (3, Assoc::Left),
        Greater | Less | GreaterEqual | LessEqual => (4, Assoc::NonAssoc),
        Add | Subtract => (5, Assoc::Left),
        Multiply | Divide => (6, Assoc::Left),
        Power => (7, Assoc::Left),
    };
    Precedence { level, assoc }
}

/// The binary operator a token stands for, if any.
pub fn binary_operator(token: &TokenType) -> Option<BinaryOperator> {
    let operator = match token {
        TokenType::Plus => BinaryOperator::Add,
        TokenType::Minus => BinaryOperator::Subtract,
        TokenType::Star => BinaryOperator::Multiply,
        TokenType::Slash => BinaryOperator::Divide,
        TokenType::Caret => BinaryOperator::Power,
        TokenType::Greater => BinaryOperator::Greater,
        TokenType::Less => BinaryOperator::Less,
        TokenType::GreaterEqual => BinaryOperator::GreaterEqual,
        TokenType::LessEqual => BinaryOperator::LessEqual,
        TokenType::EqualEqual => BinaryOperator::Equal,
        TokenType::NotEqual => BinaryOperator::NotEqual,
        TokenType::And => BinaryOperator::And,
        TokenType::Or => BinaryOperator::Or,
        _ => return None,
    };
    Some(operator)
}

/// What the engine does with `incoming` when `stacked` is on top of the
/// operator stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift,
    Reduce,
    /// Two non-associative operators meet (`a < b < c`).
    Error,
}

pub fn resolve(stacked: BinaryOperator, incoming: BinaryOperator) -> Action {
    let stacked = precedence(stacked);
    let incoming = precedence(incoming);

    if stacked.level > incoming.level {
        return Action::Reduce;
    }
    if stacked.level < incoming.level {
        return Action::Shift;
    }
    match incoming.assoc {
        Assoc::Left => Action::Reduce,
        Assoc::NonAssoc => Action::Error,
    }
}
