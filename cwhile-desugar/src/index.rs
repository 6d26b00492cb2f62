use cwhile_parser::{
    block::Block,
    expressions::Expression,
    identifiers::Ident,
    statement::{
        for_loop::ForLoop,
        range_loop::RangeLoop,
        Statement,
    },
};
use indexmap::IndexMap;
use tracing::debug;

use crate::engine::NameGenerator;

/// Identity of a loop node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LoopKey(*const ());

impl From<&ForLoop<'_>> for LoopKey {
    fn from(for_loop: &ForLoop<'_>) -> Self {
        Self((for_loop as *const ForLoop).cast())
    }
}

impl From<&RangeLoop<'_>> for LoopKey {
    fn from(range_loop: &RangeLoop<'_>) -> Self {
        Self((range_loop as *const RangeLoop).cast())
    }
}

/// The counters backing `for.index`, keyed by the loop they count. Loops
/// whose body never reads `for.index` get no entry.
#[derive(Debug, Default)]
pub(crate) struct IndexBindings {
    counters: IndexMap<LoopKey, Ident>,
}

impl IndexBindings {
    pub(crate) fn collect_block(block: &Block, names: &mut NameGenerator) -> Self {
        let mut bindings = Self::default();
        bindings.visit_block(block, names);
        bindings
    }

    pub(crate) fn collect_statement(statement: &Statement, names: &mut NameGenerator) -> Self {
        let mut bindings = Self::default();
        bindings.visit_statement(statement, names);
        bindings
    }

    pub(crate) fn counter(&self, key: LoopKey) -> Option<Ident> {
        self.counters.get(&key).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.counters.len()
    }

    fn assign(&mut self, key: LoopKey, names: &mut NameGenerator) {
        let counter = names.fresh("idx");
        debug!(%counter, "injecting loop counter");
        self.counters.insert(key, counter);
    }

    fn visit_block(&mut self, block: &Block, names: &mut NameGenerator) {
        for statement in block.statements {
            self.visit_statement(statement, names);
        }
    }

    fn visit_statement(&mut self, statement: &Statement, names: &mut NameGenerator) {
        match statement {
            Statement::For(stat) => {
                if block_reads_index(&stat.body) {
                    self.assign(LoopKey::from(*stat), names);
                }
                self.visit_block(&stat.body, names);
            }
            Statement::ForRange(stat) => {
                if block_reads_index(&stat.body) {
                    self.assign(LoopKey::from(*stat), names);
                }
                self.visit_block(&stat.body, names);
            }
            Statement::Block(block) => self.visit_block(block, names),
            Statement::If(stat) => {
                self.visit_block(&stat.body, names);
                if let Some(else_final) = &stat.else_final {
                    self.visit_block(else_final, names);
                }
            }
            Statement::While(stat) => self.visit_block(&stat.body, names),
            Statement::ContinueWhile(stat) => {
                self.visit_block(&stat.body, names);
                for handler in [&stat.else_body, &stat.catch_body].into_iter().flatten() {
                    self.visit_block(handler, names);
                }
            }
            Statement::Empty(_)
            | Statement::Let(_)
            | Statement::Expression(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Return(_) => (),
        }
    }
}

/// Whether `for.index` inside `block` resolves to the loop owning `block`.
///
/// Nested `for` and range loops own their bodies, but their headers are
/// evaluated in the enclosing scope and so still count.
pub(crate) fn block_reads_index(block: &Block) -> bool {
    block.statements.iter().any(statement_reads_index)
}

fn statement_reads_index(statement: &Statement) -> bool {
    match statement {
        Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => false,
        Statement::Let(decl) => reads_index(&decl.value),
        Statement::Expression(expr) => reads_index(expr),
        Statement::Return(ret) => ret.values.iter().any(reads_index),
        Statement::Block(block) => block_reads_index(block),
        Statement::If(stat) => {
            reads_index(&stat.cond)
                || block_reads_index(&stat.body)
                || stat.else_final.as_ref().map_or(false, block_reads_index)
        }
        Statement::While(stat) => reads_index(&stat.cond) || block_reads_index(&stat.body),
        Statement::ContinueWhile(stat) => {
            reads_index(&stat.cond)
                || block_reads_index(&stat.body)
                || stat.else_body.as_ref().map_or(false, block_reads_index)
                || stat.catch_body.as_ref().map_or(false, block_reads_index)
        }
        Statement::For(stat) => {
            stat.init.map_or(false, statement_reads_index)
                || stat.condition.as_ref().map_or(false, reads_index)
                || stat.iterate.as_ref().map_or(false, reads_index)
        }
        Statement::ForRange(stat) => reads_index(&stat.sequence),
    }
}

/// `for.index` is the only extension node an expression can hold.
fn reads_index(expr: &Expression) -> bool {
    expr.contains_extension()
}

#[cfg(test)]
mod tests {
    use cwhile_parser::{
        parse_chunk,
        statement::Statement,
        ASTAllocator,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::{
        block_reads_index,
        IndexBindings,
        LoopKey,
    };
    use crate::engine::NameGenerator;

    #[test]
    pub fn skips_loops_without_index() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk("for (x : xs) { print(x); }", &alloc)?;

        let bindings = IndexBindings::collect_block(&chunk, &mut NameGenerator::default());
        assert_eq!(bindings.len(), 0);

        Ok(())
    }

    #[test]
    pub fn resolves_to_innermost_for() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            for (x : xs) {
                for (y : ys) {
                    print(for.index);
                }
            }
        "};
        let chunk = parse_chunk(src, &alloc)?;

        let bindings = IndexBindings::collect_block(&chunk, &mut NameGenerator::default());
        assert_eq!(bindings.len(), 1);

        let Statement::ForRange(outer) = chunk.statements[0] else {
            panic!("expected a range loop");
        };
        let Statement::ForRange(inner) = outer.body.statements[0] else {
            panic!("expected a nested range loop");
        };
        assert_eq!(bindings.counter(LoopKey::from(outer)), None);
        assert!(bindings.counter(LoopKey::from(inner)).is_some());

        Ok(())
    }

    #[test]
    pub fn nested_header_belongs_to_enclosing_loop() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            for (x : xs) {
                for (let i = for.index; i < 3; i += 1) {}
            }
        "};
        let chunk = parse_chunk(src, &alloc)?;

        let Statement::ForRange(outer) = chunk.statements[0] else {
            panic!("expected a range loop");
        };
        let Statement::For(inner) = outer.body.statements[0] else {
            panic!("expected a nested for loop");
        };
        assert!(block_reads_index(&outer.body));
        assert!(!block_reads_index(&inner.body));

        Ok(())
    }

    #[test]
    pub fn scans_continue_while_handlers() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            for (let i = 0; i < 3; i += 1) {
                continue while (true) {} catch { print(for.index); }
            }
        "};
        let chunk = parse_chunk(src, &alloc)?;

        let mut names = NameGenerator::default();
        let bindings = IndexBindings::collect_block(&chunk, &mut names);

        let Statement::For(host) = chunk.statements[0] else {
            panic!("expected a for loop");
        };
        assert_eq!(
            bindings.counter(LoopKey::from(host)).as_deref(),
            Some("idx$0")
        );

        Ok(())
    }
}
