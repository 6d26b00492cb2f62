use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::statement::{
    variables::Let,
    Return,
    Statement,
};

use crate::{
    engine::Desugarer,
    expressions::desugar_all,
    DesugarError,
    DesugarExpression,
    DesugarStatement,
};

pub(crate) mod continue_while;
pub(crate) mod for_loop;
pub(crate) mod if_statement;
pub(crate) mod range_loop;
pub(crate) mod while_loop;

impl<'chunk> DesugarStatement<'chunk> for Statement<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        match self {
            Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => {
                out.push(*self);
                Ok(())
            }
            Statement::Let(stat) => stat.desugar(engine, out),
            Statement::Expression(expr) => {
                out.push(Statement::Expression(expr.desugar(engine)?));
                Ok(())
            }
            Statement::Return(ret) => {
                let values = desugar_all(ret.values, engine)?;
                out.push(Statement::Return(Return { values }));
                Ok(())
            }
            Statement::Block(stat) => stat.desugar(engine, out),
            Statement::If(stat) => stat.desugar(engine, out),
            Statement::While(stat) => stat.desugar(engine, out),
            Statement::For(stat) => stat.desugar(engine, out),
            Statement::ForRange(stat) => stat.desugar(engine, out),
            Statement::ContinueWhile(stat) => stat.desugar(engine, out),
        }
    }
}

impl<'chunk> DesugarStatement<'chunk> for Let<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError> {
        let value = self.value.desugar(engine)?;
        // The new local hides an element binding of the same name from here on.
        engine.declare(self.name);

        out.push(Statement::Let(engine.alloc().alloc(Let {
            name: self.name,
            value,
        })));
        Ok(())
    }
}
