use crate::{
    block::Block,
    expressions::Expression,
    identifiers::Ident,
    lexer::Token,
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
};

/// `for (binding : sequence) body`. `binding` names the element at the
/// current position on every read inside `body`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct RangeLoop<'chunk> {
    pub binding: Ident,
    pub sequence: Expression<'chunk>,
    pub body: Block<'chunk>,
}

impl<'chunk> RangeLoop<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        let for_kw = lexer.expecting_token(Token::KWfor)?;

        lexer
            .expecting_token(Token::LParen)
            .reset_on_err(lexer, for_kw)?;
        let binding = Ident::parse(lexer).reset_on_err(lexer, for_kw)?;
        lexer
            .expecting_token(Token::Colon)
            .reset_on_err(lexer, for_kw)?;

        let sequence = Expression::parse(lexer, alloc).mark_unrecoverable()?;
        lexer
            .expecting_token(Token::RParen)
            .mark_unrecoverable()?;

        let body = Block::parse_body(lexer, alloc).mark_unrecoverable()?;

        Ok(Self {
            binding,
            sequence,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::RangeLoop;
    use crate::{
        block::Block,
        expressions::Expression,
        identifiers::Ident,
        statement::{
            for_loop::ForLoop,
            Statement,
        },
        ASTAllocator,
    };

    #[test]
    pub fn parses_range_loop() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("for (c : [1, 2]) {}", &alloc) => RangeLoop::parse)?;

        assert_eq!(
            result,
            RangeLoop {
                binding: Ident::from("c"),
                sequence: Expression::List(&[Expression::Integer(1), Expression::Integer(2)]),
                body: Block::default(),
            }
        );

        Ok(())
    }

    #[test]
    pub fn leaves_classic_for_alone() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("for (c = 0; c < 2; c += 1) {}", &alloc) => Statement::parse)?;

        assert!(matches!(result, Statement::For(ForLoop { .. })));

        Ok(())
    }
}
