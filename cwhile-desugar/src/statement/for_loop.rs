use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::{
    block::Block,
    statement::{
        for_loop::ForLoop,
        Statement,
    },
};

use crate::{
    block::desugar_body,
    engine::{
        counted_iterate,
        declare_counter,
        Desugarer,
        LoopFrame,
        LoopKind,
    },
    index::LoopKey,
    DesugarError,
    DesugarExpression,
    DesugarStatement,
};

impl<'chunk> DesugarStatement<'chunk> for ForLoop<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let counter = engine.counter_for(LoopKey::from(self));

        // A `let` in the header is visible to the rest of the loop only.
        let lowered = engine.with_scope(|engine| {
            let init = match self.init {
                Some(init) => {
                    let mut lowered = engine.alloc().new_vec();
                    init.desugar(engine, &mut lowered)?;
                    lowered.into_bump_slice().first()
                }
                None => None,
            };

            // The header is lowered before entering the loop, so `for.index`
            // there refers to the enclosing loop.
            let condition = self
                .condition
                .map(|condition| condition.desugar(engine))
                .transpose()?;
            let iterate = self
                .iterate
                .map(|iterate| iterate.desugar(engine))
                .transpose()?;
            let iterate = counted_iterate(engine.alloc(), iterate, counter);

            let frame = LoopFrame {
                kind: LoopKind::For,
                condition,
                iterate,
            };
            let body = engine.in_loop(frame, Some(counter), |engine| {
                desugar_body(engine, &self.body)
            })?;

            Ok(ForLoop {
                init,
                condition,
                iterate,
                body,
            })
        })?;

        let alloc = engine.alloc();
        let lowered = Statement::For(alloc.alloc(lowered));
        out.push(match counter {
            Some(counter) => Statement::Block(alloc.alloc(Block {
                statements: alloc.alloc_slice([declare_counter(alloc, counter), lowered]),
            })),
            None => lowered,
        });

        Ok(())
    }
}
