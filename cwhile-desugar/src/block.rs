use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::{
    block::Block,
    statement::Statement,
};
use scopeguard::guard_on_success;

use crate::{
    engine::Desugarer,
    DesugarError,
    DesugarStatement,
};

/// Lowers every statement of `block` into a fresh block. Declarations inside
/// it stop shadowing element bindings when it ends.
pub(crate) fn desugar_body<'chunk>(
    engine: &mut Desugarer<'chunk>,
    block: &Block<'chunk>,
) -> Result<Block<'chunk>, DesugarError> {
    let mark = engine.aliases_mark();
    let mut engine = guard_on_success(engine, |engine| engine.restore_aliases(mark));

    let mut statements = engine.alloc().new_vec();
    for statement in block.statements {
        statement.desugar(&mut engine, &mut statements)?;
    }

    Ok(Block {
        statements: statements.into_bump_slice(),
    })
}

impl<'chunk> DesugarStatement<'chunk> for Block<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let block = desugar_body(engine, self)?;
        out.push(Statement::Block(engine.alloc().alloc(block)));

        Ok(())
    }
}
