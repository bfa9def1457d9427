//! Operand compatibility, implicit promotion and constant folding.
//!
//! Everything here is a pure function of the operands; the parser calls in
//! while reducing an operator and gets back either the node to push or the
//! fatal error to abort with.

use std::cmp::Ordering;

use tracing::debug;

use crate::ast::{BinaryOperator, Node, Type, Value};
use crate::error::{ParseError, ParseResult};

/// An expression node together with its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub node: Node,
    pub ty: Type,
}

impl TypedExpr {
    pub fn new(node: Node, ty: Type) -> Self {
        Self { node, ty }
    }

    pub fn literal(value: Value) -> Self {
        let ty = value.ty();
        Self::new(Node::Literal { ty, value }, ty)
    }

    pub fn constant(&self) -> Option<&Value> {
        self.node.as_literal()
    }
}

/// Type-check, promote and, where both sides are constants, fold `left op right`.
pub fn check_binary(
    operator: BinaryOperator,
    left: TypedExpr,
    right: TypedExpr,
    line: usize,
) -> ParseResult<TypedExpr> {
    check_operand(operator, left.ty, line)?;
    check_operand(operator, right.ty, line)?;

    let (left, right) = promote(operator, left, right);

    if operator == BinaryOperator::Power {
        return Ok(power(left, right));
    }

    if left.ty != right.ty {
        return Err(ParseError::type_mismatch(left.ty, right.ty, line));
    }

    let ty = result_type(operator, left.ty);
    if let (Some(l), Some(r)) = (left.constant(), right.constant()) {
        if let Some(value) = fold(operator, l, r) {
            debug!(%operator, %value, line, "folded constant expression");
            return Ok(TypedExpr::literal(value));
        }
    }

    Ok(TypedExpr::new(
        Node::BinaryOp {
            operator,
            ty,
            left: Box::new(left.node),
            right: Box::new(right.node),
        },
        ty,
    ))
}

/// Unary minus: numeric operands only, constants are negated in place.
pub fn check_negate(operand: TypedExpr, line: usize) -> ParseResult<TypedExpr> {
    if !operand.ty.is_numeric() {
        return Err(ParseError::OperatorTypeIncompatible {
            operator: "-",
            operand: operand.ty,
            line,
        });
    }

    let negated = match operand.constant() {
        Some(Value::Int(v)) => v.checked_neg().map(Value::Int),
        Some(Value::Float(v)) => Some(Value::Float(-v)),
        _ => None,
    };

    Ok(match negated {
        Some(value) => TypedExpr::literal(value),
        None => {
            let ty = operand.ty;
            TypedExpr::new(
                Node::UnaryMinus {
                    ty,
                    operand: Box::new(operand.node),
                },
                ty,
            )
        }
    })
}

/// Reject operand types the operator has no meaning for.
pub fn check_operand(operator: BinaryOperator, ty: Type, line: usize) -> ParseResult<()> {
    use BinaryOperator::*;

    let compatible = match operator {
        Subtract | Multiply | Divide | Power | Greater | Less | GreaterEqual | LessEqual => {
            ty.is_numeric()
        }
        Add => ty != Type::Bool,
        And | Or => ty == Type::Bool,
        Equal | NotEqual => true,
    };

    if compatible {
        Ok(())
    } else {
        Err(ParseError::OperatorTypeIncompatible {
            operator: operator.symbol(),
            operand: ty,
            line,
        })
    }
}

fn result_type(operator: BinaryOperator, operand: Type) -> Type {
    use BinaryOperator::*;

    match operator {
        Divide => Type::Float,
        Add | Subtract | Multiply | Power => operand,
        Greater | Less | GreaterEqual | LessEqual | Equal | NotEqual | And | Or => Type::Bool,
    }
}

/// Fit a value into a variable of type `target`. INT widens into FLOAT;
/// every other pair must already match.
pub fn coerce(expr: TypedExpr, target: Type, line: usize) -> ParseResult<TypedExpr> {
    match (expr.ty, target) {
        (ty, target) if ty == target => Ok(expr),
        (Type::Int, Type::Float) => Ok(convert(expr, Type::Float)),
        (ty, target) => Err(ParseError::type_mismatch(target, ty, line)),
    }
}

/// INT meets FLOAT: the INT side becomes FLOAT (not for `^`).
/// Numeric meets STRING under `+`: the numeric side becomes its text.
pub fn promote(operator: BinaryOperator, left: TypedExpr, right: TypedExpr) -> (TypedExpr, TypedExpr) {
    match (left.ty, right.ty) {
        (Type::Int, Type::Float) if operator != BinaryOperator::Power => {
            (convert(left, Type::Float), right)
        }
        (Type::Float, Type::Int) if operator != BinaryOperator::Power => {
            (left, convert(right, Type::Float))
        }
        (Type::Int | Type::Float, Type::String) if operator == BinaryOperator::Add => {
            (convert(left, Type::String), right)
        }
        (Type::String, Type::Int | Type::Float) if operator == BinaryOperator::Add => {
            (left, convert(right, Type::String))
        }
        _ => (left, right),
    }
}

fn convert(expr: TypedExpr, target: Type) -> TypedExpr {
    let converted = match (expr.constant(), target) {
        (Some(Value::Int(v)), Type::Float) => Some(Value::Float(*v as f64)),
        (Some(value), Type::String) => Some(Value::Str(value.to_string())),
        _ => None,
    };

    match converted {
        Some(value) => TypedExpr::literal(value),
        None => TypedExpr::new(
            Node::Convert {
                ty: target,
                operand: Box::new(expr.node),
            },
            target,
        ),
    }
}

/// `^` typing: INT only when the base is INT and the exponent is whole.
fn power(base: TypedExpr, exponent: TypedExpr) -> TypedExpr {
    let whole_exponent = match exponent.constant() {
        Some(Value::Float(e)) => e.fract() == 0.0,
        Some(_) => true,
        None => exponent.ty == Type::Int,
    };
    let ty = if whole_exponent { base.ty } else { Type::Float };

    if let (Some(b), Some(e)) = (base.constant(), exponent.constant()) {
        if let Some(value) = fold_power(b, e, ty) {
            debug!(%value, "folded exponentiation");
            return TypedExpr::literal(value);
        }
    }

    TypedExpr::new(
        Node::BinaryOp {
            operator: BinaryOperator::Power,
            ty,
            left: Box::new(base.node),
            right: Box::new(exponent.node),
        },
        ty,
    )
}

fn fold_power(base: &Value, exponent: &Value, ty: Type) -> Option<Value> {
    let value = match ty {
        Type::Int => {
            let b = match base {
                Value::Int(b) => *b,
                _ => return None,
            };
            let e = match exponent {
                Value::Int(e) => *e,
                Value::Float(e) if e.fract() == 0.0 && e.abs() <= u32::MAX as f64 => *e as i64,
                _ => return None,
            };
            Value::Int(b.checked_pow(u32::try_from(e).ok()?)?)
        }
        _ => {
            let result = as_f64(base)?.powf(as_f64(exponent)?);
            if !result.is_finite() {
                return None;
            }
            Value::Float(result)
        }
    };
    Some(value)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

/// Evaluate an operator over two constants of the same type. `None` leaves
/// the expression unfolded (overflow, division by zero).
pub fn fold(operator: BinaryOperator, left: &Value, right: &Value) -> Option<Value> {
    use BinaryOperator::*;

    match (left, right) {
        (Value::Int(l), Value::Int(r)) => match operator {
            Add => l.checked_add(*r).map(Value::Int),
            Subtract => l.checked_sub(*r).map(Value::Int),
            Multiply => l.checked_mul(*r).map(Value::Int),
            Divide if *r != 0 => Some(Value::Float(*l as f64 / *r as f64)),
            Divide => None,
            _ => compare(operator, l.partial_cmp(r)),
        },
        (Value::Float(l), Value::Float(r)) => match operator {
            Add => Some(Value::Float(l + r)),
            Subtract => Some(Value::Float(l - r)),
            Multiply => Some(Value::Float(l * r)),
            Divide if *r != 0.0 => Some(Value::Float(l / r)),
            Divide => None,
            _ => compare(operator, l.partial_cmp(r)),
        },
        (Value::Str(l), Value::Str(r)) => match operator {
            Add => Some(Value::Str(format!("{}{}", l, r))),
            _ => compare(operator, l.partial_cmp(r)),
        },
        (Value::Bool(l), Value::Bool(r)) => match operator {
            And => Some(Value::Bool(*l && *r)),
            Or => Some(Value::Bool(*l || *r)),
            _ => compare(operator, l.partial_cmp(r)),
        },
        _ => None,
    }
}

fn compare(operator: BinaryOperator, ordering: Option<Ordering>) -> Option<Value> {
    use BinaryOperator::*;

    let ordering = ordering?;
    let result = match operator {
        Greater => ordering == Ordering::Greater,
        Less => ordering == Ordering::Less,
        GreaterEqual => ordering != Ordering::Less,
        LessEqual => ordering != Ordering::Greater,
        Equal => ordering == Ordering::Equal,
        NotEqual => ordering != Ordering::Equal,
        _ => return None,
    };
    Some(Value::Bool(result))
}
