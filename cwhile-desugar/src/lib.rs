use bumpalo::collections::Vec as BumpVec;
use cwhile_parser::{
    block::Block,
    expressions::Expression,
    identifiers::Ident,
    statement::{
        for_loop::ForLoop,
        range_loop::RangeLoop,
        Statement,
    },
    ASTAllocator,
};
use thiserror::Error;
use tracing::{
    instrument,
    trace,
};

mod block;
mod engine;
mod expressions;
mod index;
mod statement;
mod validate;

use self::{
    engine::{
        Desugarer,
        NameGenerator,
    },
    index::IndexBindings,
};
pub use self::validate::{
    check_scopes,
    validate,
};

/// What keeps a `continue while` from borrowing its enclosing loop's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LoopDefect {
    #[display(fmt = "the enclosing for loop has no condition")]
    MissingCondition,
    #[display(fmt = "the enclosing for loop has no iterate expression")]
    MissingIterate,
    #[display(fmt = "there is no enclosing for loop")]
    NoEnclosingLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Malformed `continue while`: {defect}")]
pub struct MalformedLoopExtension {
    pub defect: LoopDefect,
}

impl From<LoopDefect> for MalformedLoopExtension {
    fn from(defect: LoopDefect) -> Self {
        Self { defect }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OutOfScopeLoopVariable {
    #[error("`{0}` cannot be read here, its range loop may already be exhausted")]
    ElementBinding(Ident),
    #[error("`{0}` is the element binding of a range loop and cannot be assigned")]
    AssignedElementBinding(Ident),
    #[error("`for.index` used outside of any for loop")]
    LoopIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DesugarError {
    #[error(transparent)]
    Malformed(#[from] MalformedLoopExtension),
    #[error(transparent)]
    OutOfScope(#[from] OutOfScopeLoopVariable),
}

trait DesugarExpression<'chunk> {
    fn desugar(&self, engine: &mut Desugarer<'chunk>) -> Result<Expression<'chunk>, DesugarError>;
}

/// Lowers a statement into zero or more primitive statements appended to
/// `out`.
trait DesugarStatement<'chunk> {
    fn desugar(
        &self,
        engine: &mut Desugarer<'chunk>,
        out: &mut BumpVec<'chunk, Statement<'chunk>>,
    ) -> Result<(), DesugarError>;
}

/// Rewrites `for_loop` into primitives only. Every `continue while` and
/// `for.index` inside it is consumed, as are nested range loops.
#[instrument(level = "trace", name = "desugar", skip_all)]
pub fn desugar<'chunk>(
    for_loop: &ForLoop<'chunk>,
    alloc: &'chunk ASTAllocator,
) -> Result<Statement<'chunk>, DesugarError> {
    let root = Statement::For(alloc.alloc(*for_loop));
    desugar_root(root, alloc)
}

/// Lowers a range loop into a counted `for` loop, then desugars it.
#[instrument(level = "trace", name = "desugar_range", skip_all)]
pub fn desugar_range<'chunk>(
    range_loop: &RangeLoop<'chunk>,
    alloc: &'chunk ASTAllocator,
) -> Result<Statement<'chunk>, DesugarError> {
    let root = Statement::ForRange(alloc.alloc(*range_loop));
    desugar_root(root, alloc)
}

/// Desugars every loop in `block`. Running this over its own output yields a
/// structurally equal block.
#[instrument(level = "trace", name = "desugar_block", skip_all, fields(statements = block.statements.len()))]
pub fn desugar_block<'chunk>(
    block: &Block<'chunk>,
    alloc: &'chunk ASTAllocator,
) -> Result<Block<'chunk>, DesugarError> {
    validate::validate_block(block)?;
    validate::check_block_scopes(block)?;

    let mut names = NameGenerator::default();
    let counters = IndexBindings::collect_block(block, &mut names);
    trace!(counters = counters.len(), "resolved loop counters");

    let mut engine = Desugarer::new(alloc, names, counters);
    block::desugar_body(&mut engine, block)
}

fn desugar_root<'chunk>(
    root: Statement<'chunk>,
    alloc: &'chunk ASTAllocator,
) -> Result<Statement<'chunk>, DesugarError> {
    validate::validate_statement(&root)?;
    validate::check_statement_scopes(&root)?;

    let mut names = NameGenerator::default();
    let counters = IndexBindings::collect_statement(&root, &mut names);
    trace!(counters = counters.len(), "resolved loop counters");
    let mut engine = Desugarer::new(alloc, names, counters);

    let mut out = alloc.new_vec();
    root.desugar(&mut engine, &mut out)?;

    if let [single] = out.as_slice() {
        return Ok(*single);
    }

    Ok(Statement::Block(alloc.alloc(Block {
        statements: out.into_bump_slice(),
    })))
}

#[cfg(test)]
mod tests {
    use cwhile_parser::{
        expressions::{
            operator::{
                AssignOp,
                Assignment,
                BinaryKind,
                BinaryOperator,
                UnaryOperator,
            },
            Call,
            Expression,
            Index,
        },
        identifiers::Ident,
        parse_chunk,
        statement::{
            variables::Let,
            Break,
            Statement,
        },
        ASTAllocator,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::{
        desugar,
        desugar_block,
        desugar_range,
        DesugarError,
        LoopDefect,
        MalformedLoopExtension,
        OutOfScopeLoopVariable,
    };

    #[test]
    pub fn lowers_continue_while_in_place() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            for (let i = 0; i < n; i += 1) {
                continue while (ok) step(); catch { fail(); }
            }
        "};
        let chunk = parse_chunk(src, &alloc)?;
        let out = desugar_block(&chunk, &alloc)?;

        let Statement::For(host) = out.statements[0] else {
            panic!("expected the host loop, got {:?}", out.statements[0]);
        };
        let (Some(outer_cond), Some(iterate)) = (host.condition, host.iterate) else {
            panic!("host lost its header");
        };
        assert_eq!(host.body.statements.len(), 2);

        let Statement::For(inner) = host.body.statements[0] else {
            panic!("expected the inner loop");
        };
        assert_eq!(inner.init, None);
        assert_eq!(inner.iterate, Some(iterate));
        assert_eq!(
            inner.condition,
            Some(Expression::BinaryOp(BinaryOperator {
                kind: BinaryKind::And,
                lhs: &outer_cond,
                rhs: &Expression::Variable(Ident::from("ok")),
            }))
        );

        let Statement::If(check) = host.body.statements[1] else {
            panic!("expected the completion check");
        };
        assert_eq!(
            check.cond,
            Expression::UnaryOp(UnaryOperator::Not(&outer_cond))
        );
        assert_eq!(check.body.statements.len(), 2);
        assert_eq!(check.body.statements[1], Statement::Break(Break));
        assert_eq!(check.else_final, None);

        Ok(())
    }

    #[test]
    pub fn else_runs_on_both_exits_without_catch() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            for (let i = 0; i < n; i += 1) {
                continue while (ok) {} else { done(); }
            }
        "};
        let chunk = parse_chunk(src, &alloc)?;
        let out = desugar_block(&chunk, &alloc)?;

        let Statement::For(host) = out.statements[0] else {
            panic!("expected the host loop");
        };
        let Statement::If(check) = host.body.statements[1] else {
            panic!("expected the completion check");
        };
        let else_final = check.else_final.expect("else branch for the inner exit");

        assert_eq!(else_final.statements, &check.body.statements[..1]);

        Ok(())
    }

    #[test]
    pub fn leaves_host_through_while_with_exit_flag() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            for (let i = 0; i < n; i += 1) {
                while (busy) {
                    continue while (ok) {}
                }
            }
        "};
        let chunk = parse_chunk(src, &alloc)?;
        let out = desugar_block(&chunk, &alloc)?;
        let flag = Ident::from("exit$0");

        let Statement::For(host) = out.statements[0] else {
            panic!("expected the host loop, got {:?}", out.statements[0]);
        };
        assert_eq!(host.body.statements.len(), 3);
        assert_eq!(
            host.body.statements[0],
            Statement::Let(&Let {
                name: flag,
                value: Expression::Bool(false),
            })
        );

        let Statement::While(nested) = host.body.statements[1] else {
            panic!("expected the while loop");
        };
        let Statement::If(check) = nested.body.statements[1] else {
            panic!("expected the completion check");
        };
        assert_eq!(
            check.body.statements,
            &[
                Statement::Expression(Expression::Assign(&Assignment {
                    target: flag,
                    op: AssignOp::Set,
                    value: Expression::Bool(true),
                })),
                Statement::Break(Break),
            ]
        );

        let Statement::If(leave) = host.body.statements[2] else {
            panic!("expected the exit flag test after the while loop");
        };
        assert_eq!(leave.cond, Expression::Variable(flag));
        assert_eq!(leave.body.statements, &[Statement::Break(Break)]);
        assert_eq!(leave.else_final, None);

        Ok(())
    }

    #[test]
    pub fn lowers_range_loop_with_counter() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk("for (x : xs) { print(x, for.index); }", &alloc)?;
        let out = desugar_block(&chunk, &alloc)?;

        let idx = Ident::from("idx$0");
        let seq = Ident::from("seq$1");
        let pos = Ident::from("pos$2");

        let Statement::Block(lowered) = out.statements[0] else {
            panic!("expected a wrapping block, got {:?}", out.statements[0]);
        };
        assert_eq!(
            lowered.statements[..2],
            [
                Statement::Let(&Let {
                    name: seq,
                    value: Expression::Variable(Ident::from("xs")),
                }),
                Statement::Let(&Let {
                    name: idx,
                    value: Expression::Integer(0),
                }),
            ]
        );

        let Statement::For(counted) = lowered.statements[2] else {
            panic!("expected the counted loop");
        };
        assert_eq!(
            counted.condition,
            Some(Expression::BinaryOp(BinaryOperator {
                kind: BinaryKind::LessThan,
                lhs: &Expression::Variable(pos),
                rhs: &Expression::Call(&Call {
                    function: Ident::from("len"),
                    args: &[Expression::Variable(seq)],
                }),
            }))
        );
        assert!(matches!(counted.iterate, Some(Expression::Sequence([_, _]))));
        assert_eq!(
            counted.body.statements,
            &[Statement::Expression(Expression::Call(&Call {
                function: Ident::from("print"),
                args: &[
                    Expression::Index(&Index {
                        target: Expression::Variable(seq),
                        index: Expression::Variable(pos),
                    }),
                    Expression::Variable(idx),
                ],
            }))]
        );

        Ok(())
    }

    #[test]
    pub fn local_shadows_element_binding() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk("for (x : xs) { let x = x + 1; print(x); }", &alloc)?;
        let out = desugar_block(&chunk, &alloc)?;

        let Statement::Block(lowered) = out.statements[0] else {
            panic!("expected a wrapping block");
        };
        let Statement::For(counted) = lowered.statements[1] else {
            panic!("expected the counted loop");
        };
        let [Statement::Let(shadow), Statement::Expression(print)] = counted.body.statements else {
            panic!("unexpected body {:?}", counted.body);
        };

        // The initializer still reads the element, the call reads the local.
        assert!(matches!(
            shadow.value,
            Expression::BinaryOp(BinaryOperator {
                lhs: Expression::Index(_),
                ..
            })
        ));
        assert_eq!(
            *print,
            Expression::Call(&Call {
                function: Ident::from("print"),
                args: &[Expression::Variable(Ident::from("x"))],
            })
        );

        Ok(())
    }

    #[test]
    pub fn output_is_extension_free_and_stable() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {r#"
            let out = "";
            for (c : s) {
                continue while (c == "(" || inside) {
                    inside = c != ")";
                    continue while (deep) { deep = false; }
                } else {
                    total += for.index;
                }
                out = out + c;
            }
        "#};
        let chunk = parse_chunk(src, &alloc)?;
        assert!(chunk.contains_extension());

        let once = desugar_block(&chunk, &alloc)?;
        assert!(!once.contains_extension());

        let twice = desugar_block(&once, &alloc)?;
        assert_eq!(twice, once);

        Ok(())
    }

    #[test]
    pub fn desugars_single_loop() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk("for (let i = 0; i < 3; i += 1) { print(for.index); }", &alloc)?;
        let Statement::For(for_loop) = chunk.statements[0] else {
            panic!("expected a for loop");
        };

        let lowered = desugar(for_loop, &alloc)?;
        let Statement::Block(wrapped) = lowered else {
            panic!("expected the counter to be declared in a block, got {lowered:?}");
        };
        assert_eq!(
            wrapped.statements[0],
            Statement::Let(&Let {
                name: Ident::from("idx$0"),
                value: Expression::Integer(0),
            })
        );
        assert!(!lowered.contains_extension());

        Ok(())
    }

    #[test]
    pub fn desugars_single_range_loop() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk("for (x : xs) { continue while (x) {} catch { done(); } }", &alloc)?;
        let Statement::ForRange(range_loop) = chunk.statements[0] else {
            panic!("expected a range loop");
        };

        let lowered = desugar_range(range_loop, &alloc)?;
        let Statement::Block(wrapped) = lowered else {
            panic!("expected the sequence to be bound in a block, got {lowered:?}");
        };
        assert!(matches!(
            wrapped.statements,
            [Statement::Let(_), Statement::For(_)]
        ));
        assert!(!lowered.contains_extension());

        Ok(())
    }

    #[test]
    pub fn reports_while_without_for_host() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk("while (go) { continue while (more) {} }", &alloc)?;

        assert_eq!(
            desugar_block(&chunk, &alloc).unwrap_err(),
            DesugarError::Malformed(MalformedLoopExtension {
                defect: LoopDefect::NoEnclosingLoop,
            })
        );

        Ok(())
    }

    #[test]
    pub fn reports_element_read_after_exhaustion() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let chunk = parse_chunk(
            "for (x : xs) { continue while (x > 0) {} catch { print(x); } }",
            &alloc,
        )?;

        assert_eq!(
            desugar_block(&chunk, &alloc).unwrap_err(),
            DesugarError::OutOfScope(OutOfScopeLoopVariable::ElementBinding(Ident::from("x")))
        );

        Ok(())
    }
}
