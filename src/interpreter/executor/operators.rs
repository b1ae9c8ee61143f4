//! Binary and unary operator evaluation.

use std::cmp::Ordering;
use std::io::Write;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::value::{Object, Value};

use super::{Interpreter, RuntimeResult};

impl<W: Write> Interpreter<W> {
    pub(crate) fn evaluate_unary(
        &self,
        operator: UnaryOp,
        value: Value,
        line: usize,
    ) -> RuntimeResult<Value> {
        match (operator, value) {
            (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
            (UnaryOp::Negate, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::IntegerOverflow {
                    operator: operator.to_string(),
                    line,
                }),
            (UnaryOp::Negate, Value::Double(n)) => Ok(Value::Double(-n)),
            (UnaryOp::Negate, Value::Nil) => Err(RuntimeError::missing_operand("-", line)),
            (UnaryOp::Negate, other) => Err(RuntimeError::InvalidOperand {
                operator: operator.to_string(),
                found: other.type_name(),
                line,
            }),
        }
    }

    pub(crate) fn evaluate_binary(
        &self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        line: usize,
    ) -> RuntimeResult<Value> {
        match op {
            BinaryOp::Equal => Ok(Value::Bool(left == right)),
            BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                self.eval_arithmetic(op, left, right, line)
            }
            BinaryOp::Less => self.compare_values(op, left, right, line, Ordering::is_lt),
            BinaryOp::LessEqual => self.compare_values(op, left, right, line, Ordering::is_le),
            BinaryOp::Greater => self.compare_values(op, left, right, line, Ordering::is_gt),
            BinaryOp::GreaterEqual => self.compare_values(op, left, right, line, Ordering::is_ge),
        }
    }

    fn eval_arithmetic(
        &self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        line: usize,
    ) -> RuntimeResult<Value> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b, line),
            (Value::Double(a), Value::Double(b)) => double_arithmetic(op, *a, *b, line),
            (Value::Object(Object::String(a)), Value::Object(Object::String(b)))
                if op == BinaryOp::Add =>
            {
                Ok(Value::string(format!("{}{}", a, b)))
            }
            _ => Err(operand_error(op, left, right, line)),
        }
    }

    fn compare_values<F>(
        &self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        line: usize,
        cmp: F,
    ) -> RuntimeResult<Value>
    where
        F: Fn(Ordering) -> bool,
    {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(cmp(a.cmp(b)))),
            // NaN compares false against everything
            (Value::Double(a), Value::Double(b)) => {
                Ok(Value::Bool(a.partial_cmp(b).map_or(false, cmp)))
            }
            _ => Err(operand_error(op, left, right, line)),
        }
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64, line: usize) -> RuntimeResult<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide => {
            if b == 0 {
                return Err(RuntimeError::division_by_zero(line));
            }
            a.checked_div(b)
        }
        _ => unreachable!("not an arithmetic operator: {}", op),
    };

    result.map(Value::Int).ok_or_else(|| RuntimeError::IntegerOverflow {
        operator: op.to_string(),
        line,
    })
}

fn double_arithmetic(op: BinaryOp, a: f64, b: f64, line: usize) -> RuntimeResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => {
            if b == 0.0 {
                return Err(RuntimeError::division_by_zero(line));
            }
            a / b
        }
        _ => unreachable!("not an arithmetic operator: {}", op),
    };
    Ok(Value::Double(result))
}

/// Classify an operand failure: nil operands are missing, same-typed
/// non-numeric operands are unsupported, anything else is a mismatch.
fn operand_error(op: BinaryOp, left: &Value, right: &Value, line: usize) -> RuntimeError {
    if matches!(left, Value::Nil) || matches!(right, Value::Nil) {
        return RuntimeError::missing_operand(op.to_string(), line);
    }
    if left.type_name() == right.type_name() {
        return RuntimeError::UnsupportedOperator {
            operator: op.to_string(),
            operand: left.type_name(),
            line,
        };
    }
    RuntimeError::type_mismatch(op.to_string(), left.type_name(), right.type_name(), line)
}
