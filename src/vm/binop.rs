use std::cmp::Ordering;

use cwhile_parser::expressions::operator::BinaryKind;

use crate::vm::{
    ExecutionError,
    Value,
};

fn op_name(kind: BinaryKind) -> &'static str {
    match kind {
        BinaryKind::Plus => "+",
        BinaryKind::Minus => "-",
        BinaryKind::Times => "*",
        BinaryKind::Divide => "/",
        BinaryKind::Modulo => "%",
        BinaryKind::LessThan => "<",
        BinaryKind::LessEqual => "<=",
        BinaryKind::GreaterThan => ">",
        BinaryKind::GreaterEqual => ">=",
        BinaryKind::Equals => "==",
        BinaryKind::NotEqual => "!=",
        BinaryKind::And => "&&",
        BinaryKind::Or => "||",
    }
}

/// Applies a strict binary operator. `&&` and `||` short-circuit in the
/// evaluator and only reach this point with both operands evaluated.
pub fn apply(kind: BinaryKind, lhs: Value, rhs: Value) -> Result<Value, ExecutionError> {
    let mismatch = |lhs: &Value, rhs: &Value| ExecutionError::BinaryTypeMismatch {
        op: op_name(kind),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    match kind {
        BinaryKind::Equals => return Ok(Value::Bool(lhs == rhs)),
        BinaryKind::NotEqual => return Ok(Value::Bool(lhs != rhs)),
        BinaryKind::LessThan
        | BinaryKind::LessEqual
        | BinaryKind::GreaterThan
        | BinaryKind::GreaterEqual => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| mismatch(&lhs, &rhs))?;
            return Ok(Value::Bool(match kind {
                BinaryKind::LessThan => ordering.is_lt(),
                BinaryKind::LessEqual => ordering.is_le(),
                BinaryKind::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            }));
        }
        _ => (),
    }

    match (kind, lhs, rhs) {
        (BinaryKind::Plus, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_add(r))),
        (BinaryKind::Plus, Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
        (BinaryKind::Plus, Value::List(mut l), Value::List(r)) => {
            l.extend(r);
            Ok(Value::List(l))
        }
        (BinaryKind::Minus, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_sub(r))),
        (BinaryKind::Times, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_mul(r))),
        (BinaryKind::Divide | BinaryKind::Modulo, Value::Int(_), Value::Int(0)) => {
            Err(ExecutionError::DivideByZero)
        }
        (BinaryKind::Divide, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_div(r))),
        (BinaryKind::Modulo, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_rem(r))),
        (BinaryKind::And, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l && r)),
        (BinaryKind::Or, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l || r)),
        (_, lhs, rhs) => Err(mismatch(&lhs, &rhs)),
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use cwhile_parser::expressions::operator::BinaryKind;
    use pretty_assertions::assert_eq;

    use super::apply;
    use crate::vm::{
        ExecutionError,
        Value,
    };

    #[test]
    fn concatenates_strings_and_lists() -> anyhow::Result<()> {
        assert_eq!(
            apply(BinaryKind::Plus, "a".into(), "d".into())?,
            Value::from("ad")
        );
        assert_eq!(
            apply(
                BinaryKind::Plus,
                Value::List(vec![Value::Int(1)]),
                Value::List(vec![Value::Int(2)])
            )?,
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );

        Ok(())
    }

    #[test]
    fn compares_strings() -> anyhow::Result<()> {
        assert_eq!(
            apply(BinaryKind::LessThan, "a".into(), "b".into())?,
            Value::Bool(true)
        );

        Ok(())
    }

    #[test]
    fn equality_spans_types() -> anyhow::Result<()> {
        assert_eq!(
            apply(BinaryKind::Equals, Value::Int(1), "1".into())?,
            Value::Bool(false)
        );

        Ok(())
    }

    #[test]
    fn rejects_mixed_arithmetic() {
        assert_eq!(
            apply(BinaryKind::Minus, "a".into(), Value::Int(1)),
            Err(ExecutionError::BinaryTypeMismatch {
                op: "-",
                lhs: "string",
                rhs: "int",
            })
        );
    }

    #[test]
    fn reports_division_by_zero() {
        assert_eq!(
            apply(BinaryKind::Modulo, Value::Int(4), Value::Int(0)),
            Err(ExecutionError::DivideByZero)
        );
    }
}
