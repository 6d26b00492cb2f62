use crate::{
    block::Block,
    expressions::Expression,
    lexer::Token,
    statement::{
        parse_expression_statement,
        variables::Let,
        Statement,
    },
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
    SyntaxError,
};

/// `for (init; condition; iterate) body`, every header part optional.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct ForLoop<'chunk> {
    pub init: Option<&'chunk Statement<'chunk>>,
    pub condition: Option<Expression<'chunk>>,
    pub iterate: Option<Expression<'chunk>>,
    pub body: Block<'chunk>,
}

impl<'chunk> ForLoop<'chunk> {
    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn has_iterate(&self) -> bool {
        self.iterate.is_some()
    }

    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        let for_kw = lexer.expecting_token(Token::KWfor)?;
        lexer
            .expecting_token(Token::LParen)
            .reset_on_err(lexer, for_kw)?;

        let init = if lexer.next_if_eq(Token::Semicolon).is_some() {
            None
        } else {
            let init = { Let::parse(lexer, alloc).map(|stat| Statement::Let(alloc.alloc(stat))) }
                .recover_with(|| parse_expression_statement(lexer, alloc))
                .recover()?;

            match init {
                Some(init) => Some(&*alloc.alloc(init)),
                None => {
                    return Err(ParseError::unrecoverable_from_here(
                        lexer,
                        SyntaxError::InvalidForInit,
                    ))
                }
            }
        };

        let condition = Expression::parse(lexer, alloc).recover()?;
        lexer
            .expecting_token(Token::Semicolon)
            .mark_unrecoverable()?;

        let iterate = Expression::parse(lexer, alloc).recover()?;
        lexer
            .expecting_token(Token::RParen)
            .mark_unrecoverable()?;

        let body = Block::parse_body(lexer, alloc).mark_unrecoverable()?;

        Ok(Self {
            init,
            condition,
            iterate,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::ForLoop;
    use crate::{
        block::Block,
        expressions::{
            operator::{
                AssignOp,
                Assignment,
                BinaryKind,
                BinaryOperator,
            },
            Expression,
        },
        identifiers::Ident,
        statement::{
            variables::Let,
            Statement,
        },
        ASTAllocator,
        SyntaxError,
    };

    #[test]
    pub fn parses_for() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("for (let i = 0; i < 10; i += 1) {}", &alloc) => ForLoop::parse)?;

        assert_eq!(
            result,
            ForLoop {
                init: Some(&Statement::Let(&Let {
                    name: Ident::from("i"),
                    value: Expression::Integer(0),
                })),
                condition: Some(Expression::BinaryOp(BinaryOperator {
                    kind: BinaryKind::LessThan,
                    lhs: &Expression::Variable(Ident::from("i")),
                    rhs: &Expression::Integer(10),
                })),
                iterate: Some(Expression::Assign(&Assignment {
                    target: Ident::from("i"),
                    op: AssignOp::Add,
                    value: Expression::Integer(1),
                })),
                body: Block::default(),
            }
        );
        assert!(result.has_condition());
        assert!(result.has_iterate());

        Ok(())
    }

    #[test]
    pub fn parses_empty_header() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("for (;;) ;", &alloc) => ForLoop::parse)?;

        assert_eq!(
            result,
            ForLoop {
                body: Block {
                    statements: &[Statement::Empty(crate::statement::Empty)],
                },
                ..Default::default()
            }
        );
        assert!(!result.has_condition());
        assert!(!result.has_iterate());

        Ok(())
    }

    #[test]
    pub fn parses_expression_init() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("for (i = 0; ; i = i + 1) {}", &alloc) => ForLoop::parse)?;

        assert!(matches!(result.init, Some(Statement::Expression(_))));
        assert!(!result.has_condition());
        assert!(result.has_iterate());

        Ok(())
    }

    #[test]
    pub fn rejects_statement_init() {
        let alloc = ASTAllocator::default();
        let err = final_parser!(("for (break; ;) {}", &alloc) => ForLoop::parse).unwrap_err();

        assert_eq!(err.error.error, SyntaxError::InvalidForInit);
    }
}
