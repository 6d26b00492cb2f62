use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::{
    block::Block,
    expressions::Expression,
    statement::{
        if_statement::If,
        variables::Let,
        while_loop::WhileLoop,
        Break,
        Statement,
    },
};

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
};

/// A `continue while` inside this loop whose host is further out leaves it
/// through an exit flag:
///
/// ```text
/// let exit = false;
/// while (C) B
/// if (exit) { break; }
/// ```
///
/// Only the outermost `while` in the host declares the flag. Every `while`
/// between the `continue while` and its host tests it.
impl<'chunk> DesugarStatement<'chunk> for WhileLoop<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let cond = self.cond.desugar(engine)?;
        let outermost = !engine.in_while();

        let frame = LoopFrame {
            kind: LoopKind::While,
            condition: Some(cond),
            iterate: None,
        };
        // `for.index` inside keeps resolving to the enclosing for loop.
        let body = engine.in_loop(frame, None, |engine| desugar_body(engine, &self.body))?;

        let exit = if outermost {
            engine.take_exit_flag()
        } else {
            engine.pending_exit_flag()
        };

        let alloc = engine.alloc();
        if let (true, Some(flag)) = (outermost, exit) {
            out.push(Statement::Let(alloc.alloc(Let {
                name: flag,
                value: Expression::Bool(false),
            })));
        }

        out.push(Statement::While(alloc.alloc(WhileLoop { cond, body })));

        if let Some(flag) = exit {
            out.push(Statement::If(alloc.alloc(If {
                cond: Expression::Variable(flag),
                body: Block {
                    statements: alloc.alloc_slice([Statement::Break(Break)]),
                },
                else_final: None,
            })));
        }
        Ok(())
    }
}
