use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::{
    block::Block,
    expressions::{
        operator::{
            BinaryKind,
            BinaryOperator,
        },
        Call,
        Expression,
        Index,
    },
    identifiers::Ident,
    statement::{
        for_loop::ForLoop,
        range_loop::RangeLoop,
        variables::Let,
        Statement,
    },
};
use tracing::trace;

use crate::{
    block::desugar_body,
    engine::{
        counted_iterate,
        declare_counter,
        increment,
        Desugarer,
        LoopFrame,
        LoopKind,
    },
    index::LoopKey,
    DesugarError,
    DesugarExpression,
    DesugarStatement,
};

/// Lowers `for (x : xs) body` to
///
/// ```text
/// {
///     let seq = xs;
///     for (let pos = 0; pos < len(seq); pos = pos + 1) body[x := seq[pos]]
/// }
/// ```
///
/// Reads of `x` are replaced rather than copied into a local, so a borrowed
/// inner loop advancing `pos` also moves `x` along.
impl<'chunk> DesugarStatement<'chunk> for RangeLoop<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let counter = engine.counter_for(LoopKey::from(self));
        let sequence = self.sequence.desugar(engine)?;

        let seq = engine.fresh_name("seq");
        let pos = engine.fresh_name("pos");
        trace!(binding = %self.binding, %seq, %pos, "lowering range loop");

        let alloc = engine.alloc();
        let condition = Expression::BinaryOp(BinaryOperator::new(
            alloc,
            BinaryKind::LessThan,
            Expression::Variable(pos),
            Expression::Call(alloc.alloc(Call {
                function: Ident::new("len"),
                args: alloc.alloc_slice([Expression::Variable(seq)]),
            })),
        ));
        let iterate = counted_iterate(alloc, Some(increment(alloc, pos)), counter);
        let element = Expression::Index(alloc.alloc(Index {
            target: Expression::Variable(seq),
            index: Expression::Variable(pos),
        }));

        let frame = LoopFrame {
            kind: LoopKind::Range,
            condition: Some(condition),
            iterate,
        };
        let body = engine.with_scope(|engine| {
            engine.bind_alias(self.binding, element);
            engine.in_loop(frame, Some(counter), |engine| {
                desugar_body(engine, &self.body)
            })
        })?;

        let lowered = ForLoop {
            init: Some(&*alloc.alloc(Statement::Let(alloc.alloc(Let {
                name: pos,
                value: Expression::Integer(0),
            })))),
            condition: Some(condition),
            iterate,
            body,
        };

        let mut statements = alloc.new_vec();
        statements.push(Statement::Let(alloc.alloc(Let {
            name: seq,
            value: sequence,
        })));
        if let Some(counter) = counter {
            statements.push(declare_counter(alloc, counter));
        }
        statements.push(Statement::For(alloc.alloc(lowered)));

        out.push(Statement::Block(alloc.alloc(Block {
            statements: statements.into_bump_slice(),
        })));
        Ok(())
    }
}
