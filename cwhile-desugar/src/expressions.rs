use cwhile_parser::expressions::{
    operator::{
        Assignment,
        BinaryOperator,
        UnaryOperator,
    },
    Call,
    Expression,
    Index,
};

use crate::{
    engine::Desugarer,
    DesugarError,
    DesugarExpression,
    OutOfScopeLoopVariable,
};

impl<'chunk> DesugarExpression<'chunk> for Expression<'chunk> {
    fn desugar(&self, engine: &mut Desugarer<'chunk>) -> Result<Expression<'chunk>, DesugarError> {
        if !engine.rewrites_expression(self) {
            return Ok(*self);
        }

        let alloc = engine.alloc();
        Ok(match *self {
            Expression::Variable(name) => engine.alias(name).unwrap_or(*self),
            Expression::ForIndex(_) => Expression::Variable(
                engine
                    .current_index()
                    .ok_or(OutOfScopeLoopVariable::LoopIndex)?,
            ),
            Expression::Bool(_) | Expression::Integer(_) | Expression::String(_) => *self,
            Expression::Parenthesized(inner) => {
                Expression::Parenthesized(alloc.alloc(inner.desugar(engine)?))
            }
            Expression::List(items) => Expression::List(desugar_all(items, engine)?),
            Expression::Sequence(items) => Expression::Sequence(desugar_all(items, engine)?),
            Expression::Index(index) => Expression::Index(alloc.alloc(Index {
                target: index.target.desugar(engine)?,
                index: index.index.desugar(engine)?,
            })),
            Expression::Call(call) => Expression::Call(alloc.alloc(Call {
                function: call.function,
                args: desugar_all(call.args, engine)?,
            })),
            Expression::UnaryOp(op) => {
                let operand = alloc.alloc(op.operand().desugar(engine)?);
                Expression::UnaryOp(match op {
                    UnaryOperator::Not(_) => UnaryOperator::Not(operand),
                    UnaryOperator::Minus(_) => UnaryOperator::Minus(operand),
                })
            }
            Expression::BinaryOp(op) => {
                let lhs = op.lhs.desugar(engine)?;
                let rhs = op.rhs.desugar(engine)?;
                Expression::BinaryOp(BinaryOperator::new(alloc, op.kind, lhs, rhs))
            }
            Expression::Assign(assign) => Expression::Assign(alloc.alloc(Assignment {
                target: assign.target,
                op: assign.op,
                value: assign.value.desugar(engine)?,
            })),
        })
    }
}

pub(crate) fn desugar_all<'chunk>(
    exprs: &[Expression<'chunk>],
    engine: &mut Desugarer<'chunk>,
) -> Result<&'chunk [Expression<'chunk>], DesugarError> {
    let mut lowered = engine.alloc().new_vec();
    for expr in exprs {
        lowered.push(expr.desugar(engine)?);
    }

    Ok(lowered.into_bump_slice())
}
