use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::{
    block::Block,
    expressions::{
        operator::{
            AssignOp,
            Assignment,
            BinaryKind,
            BinaryOperator,
            UnaryOperator,
        },
        Expression,
    },
    statement::{
        continue_while::ContinueWhile,
        for_loop::ForLoop,
        if_statement::If,
        Break,
        Statement,
    },
};
use tracing::trace;

use crate::{
    block::desugar_body,
    engine::{
        Desugarer,
        LoopFrame,
        LoopKind,
    },
    DesugarError,
    DesugarExpression,
    DesugarStatement,
    LoopDefect,
    MalformedLoopExtension,
};

/// Replaces `continue while (C2) B else E catch K` hosted by a loop with
/// condition `C1` and iterate `I` with
///
/// ```text
/// for (; C1 && C2; I) B
/// if (!C1) { K-or-E; break; } else { E }
/// ```
///
/// The `else` branch is only emitted when `E` exists. When the `if` sits
/// directly in the host, `break` leaves it. Inside `while` loops the branch
/// sets the host's exit flag first and each `while` breaks again on it.
impl<'chunk> DesugarStatement<'chunk> for ContinueWhile<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let host = engine
            .host()
            .ok_or(LoopDefect::NoEnclosingLoop)
            .and_then(|host| host.contract())
            .map_err(MalformedLoopExtension::from)?;
        let (outer_cond, iterate) = host;
        let exit_flag = engine.exit_flag();

        let inner_cond = self.cond.desugar(engine)?;

        let alloc = engine.alloc();
        let guard = Expression::BinaryOp(BinaryOperator::new(
            alloc,
            BinaryKind::And,
            outer_cond,
            inner_cond,
        ));

        // A nested `continue while` borrows this loop's combined contract.
        let frame = LoopFrame {
            kind: LoopKind::ContinueWhile,
            condition: Some(guard),
            iterate: Some(iterate),
        };
        let body = engine.in_loop(frame, None, |engine| desugar_body(engine, &self.body))?;

        let else_body = self
            .else_body
            .as_ref()
            .map(|else_body| desugar_body(engine, else_body))
            .transpose()?;
        let catch_body = self
            .catch_body
            .as_ref()
            .map(|catch_body| desugar_body(engine, catch_body))
            .transpose()?;

        trace!(
            has_else = else_body.is_some(),
            has_catch = catch_body.is_some(),
            crosses_while = exit_flag.is_some(),
            "lowering continue while"
        );

        out.push(Statement::For(alloc.alloc(ForLoop {
            init: None,
            condition: Some(guard),
            iterate: Some(iterate),
            body,
        })));

        let mut exhausted = alloc.new_vec();
        if let Some(handler) = catch_body.or(else_body) {
            exhausted.extend(handler.statements.iter().copied());
        }
        if let Some(flag) = exit_flag {
            exhausted.push(Statement::Expression(Expression::Assign(alloc.alloc(
                Assignment {
                    target: flag,
                    op: AssignOp::Set,
                    value: Expression::Bool(true),
                },
            ))));
        }
        exhausted.push(Statement::Break(Break));

        out.push(Statement::If(alloc.alloc(If {
            cond: Expression::UnaryOp(UnaryOperator::Not(alloc.alloc(outer_cond))),
            body: Block {
                statements: exhausted.into_bump_slice(),
            },
            else_final: else_body,
        })));

        Ok(())
    }
}
