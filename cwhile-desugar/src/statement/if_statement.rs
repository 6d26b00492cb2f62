use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::statement::{
    if_statement::If,
    Statement,
};

use crate::{
    block::desugar_body,
    engine::Desugarer,
    DesugarError,
    DesugarExpression,
    DesugarStatement,
};

impl<'chunk> DesugarStatement<'chunk> for If<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let cond = self.cond.desugar(engine)?;
        let body = desugar_body(engine, &self.body)?;
        let else_final = self
            .else_final
            .as_ref()
            .map(|else_final| desugar_body(engine, else_final))
            .transpose()?;

        out.push(Statement::If(engine.alloc().alloc(If {
            cond,
            body,
            else_final,
        })));
        Ok(())
    }
}
