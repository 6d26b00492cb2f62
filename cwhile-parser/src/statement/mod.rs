use crate::{
    block::Block,
    expressions::Expression,
    lexer::Token,
    statement::{
        continue_while::ContinueWhile,
        for_loop::ForLoop,
        if_statement::If,
        range_loop::RangeLoop,
        variables::Let,
        while_loop::WhileLoop,
    },
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
    SyntaxError,
};

pub mod continue_while;
pub mod for_loop;
pub mod if_statement;
pub mod range_loop;
pub mod variables;
pub mod while_loop;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Empty;

impl Empty {
    pub(crate) fn parse(lexer: &mut PeekableLexer, _: &ASTAllocator) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::Semicolon).map(|_| Self)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Break;

impl Break {
    pub(crate) fn parse(lexer: &mut PeekableLexer, _: &ASTAllocator) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::KWbreak)?;
        lexer
            .expecting_token(Token::Semicolon)
            .mark_unrecoverable()
            .map(|_| Self)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Continue;

impl Continue {
    pub(crate) fn parse(lexer: &mut PeekableLexer, _: &ASTAllocator) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::KWcontinue)?;
        lexer
            .expecting_token(Token::Semicolon)
            .mark_unrecoverable()
            .map(|_| Self)
    }
}

#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Return<'chunk> {
    pub values: &'chunk [Expression<'chunk>],
}

impl<'chunk> Return<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::KWreturn)?;

        let values = Expression::parse_list0(lexer, alloc)?;
        lexer
            .expecting_token(Token::Semicolon)
            .mark_unrecoverable()?;

        Ok(Self { values })
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Statement<'chunk> {
    Empty(Empty),
    Let(&'chunk Let<'chunk>),
    Expression(Expression<'chunk>),
    Block(&'chunk Block<'chunk>),
    If(&'chunk If<'chunk>),
    While(&'chunk WhileLoop<'chunk>),
    For(&'chunk ForLoop<'chunk>),
    ForRange(&'chunk RangeLoop<'chunk>),
    ContinueWhile(&'chunk ContinueWhile<'chunk>),
    Break(Break),
    Continue(Continue),
    Return(Return<'chunk>),
}

impl<'chunk> Statement<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        { Empty::parse(lexer, alloc).map(Self::Empty) }
            .recover_with(|| Break::parse(lexer, alloc).map(Self::Break))
            .recover_with(|| {
                ContinueWhile::parse(lexer, alloc)
                    .map(|stat| Self::ContinueWhile(alloc.alloc(stat)))
            })
            .recover_with(|| Continue::parse(lexer, alloc).map(Self::Continue))
            .recover_with(|| Return::parse(lexer, alloc).map(Self::Return))
            .recover_with(|| Let::parse(lexer, alloc).map(|stat| Self::Let(alloc.alloc(stat))))
            .recover_with(|| If::parse(lexer, alloc).map(|stat| Self::If(alloc.alloc(stat))))
            .recover_with(|| {
                WhileLoop::parse(lexer, alloc).map(|stat| Self::While(alloc.alloc(stat)))
            })
            .recover_with(|| {
                RangeLoop::parse(lexer, alloc).map(|stat| Self::ForRange(alloc.alloc(stat)))
            })
            .recover_with(|| ForLoop::parse(lexer, alloc).map(|stat| Self::For(alloc.alloc(stat))))
            .recover_with(|| Block::parse(lexer, alloc).map(|block| Self::Block(alloc.alloc(block))))
            .recover_with(|| parse_expression_statement(lexer, alloc))
            .recover_with(|| {
                Err(ParseError::recoverable_from_here(
                    lexer,
                    SyntaxError::ExpectedStatement,
                ))
            })
    }

    /// Whether an extension node is left in this statement. Range loops count,
    /// since they only exist before lowering.
    pub fn contains_extension(&self) -> bool {
        match self {
            Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => false,
            Statement::ForRange(_) | Statement::ContinueWhile(_) => true,
            Statement::Let(decl) => decl.value.contains_extension(),
            Statement::Expression(expr) => expr.contains_extension(),
            Statement::Block(block) => block.contains_extension(),
            Statement::If(stat) => {
                stat.cond.contains_extension()
                    || stat.body.contains_extension()
                    || stat
                        .else_final
                        .as_ref()
                        .map_or(false, Block::contains_extension)
            }
            Statement::While(stat) => stat.cond.contains_extension() || stat.body.contains_extension(),
            Statement::For(stat) => {
                stat.init.map_or(false, Statement::contains_extension)
                    || stat
                        .condition
                        .as_ref()
                        .map_or(false, Expression::contains_extension)
                    || stat
                        .iterate
                        .as_ref()
                        .map_or(false, Expression::contains_extension)
                    || stat.body.contains_extension()
            }
            Statement::Return(ret) => ret.values.iter().any(Expression::contains_extension),
        }
    }
}

/// `expr ;`
pub(crate) fn parse_expression_statement<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Statement<'chunk>, ParseError> {
    let expr = Expression::parse(lexer, alloc)?;
    lexer
        .expecting_token(Token::Semicolon)
        .mark_unrecoverable()?;

    Ok(Statement::Expression(expr))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::{
        Continue,
        Return,
        Statement,
    };
    use crate::{
        block::Block,
        expressions::{
            operator::{
                AssignOp,
                Assignment,
            },
            Expression,
            ForIndex,
        },
        identifiers::Ident,
        statement::continue_while::ContinueWhile,
        ASTAllocator,
        SyntaxError,
    };

    #[test]
    pub fn parses_expression_statement() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("total += for.index;", &alloc) => Statement::parse)?;

        assert_eq!(
            result,
            Statement::Expression(Expression::Assign(&Assignment {
                target: Ident::from("total"),
                op: AssignOp::Add,
                value: Expression::ForIndex(ForIndex),
            }))
        );

        Ok(())
    }

    #[test]
    pub fn parses_return_list() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("return 1, x;", &alloc) => Statement::parse)?;

        assert_eq!(
            result,
            Statement::Return(Return {
                values: &[
                    Expression::Integer(1),
                    Expression::Variable(Ident::from("x"))
                ],
            })
        );

        Ok(())
    }

    #[test]
    pub fn parses_bare_return() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("return;", &alloc) => Statement::parse)?;

        assert_eq!(result, Statement::Return(Return::default()));

        Ok(())
    }

    #[test]
    pub fn distinguishes_continue_forms() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();

        let plain = final_parser!(("continue;", &alloc) => Statement::parse)?;
        assert_eq!(plain, Statement::Continue(Continue));

        let extended =
            final_parser!(("continue while (more) step();", &alloc) => Statement::parse)?;
        assert!(matches!(
            extended,
            Statement::ContinueWhile(ContinueWhile {
                else_body: None,
                catch_body: None,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    pub fn requires_semicolon_after_expression() {
        let alloc = ASTAllocator::default();
        let err = final_parser!(("a = 1 }", &alloc) => Statement::parse).unwrap_err();

        assert_eq!(
            err.error.error,
            SyntaxError::ExpectedToken(crate::Token::Semicolon)
        );
    }

    #[test]
    pub fn detects_extensions_in_nested_statements() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let src = indoc! {"
            while (true) {
                if (done) { break; } else { print(for.index); }
            }
        "};

        let result = final_parser!((src, &alloc) => Statement::parse)?;
        assert!(result.contains_extension());

        let plain = final_parser!(("{ if (done) { break; } }", &alloc) => Block::parse)?;
        assert!(!plain.contains_extension());

        Ok(())
    }
}
