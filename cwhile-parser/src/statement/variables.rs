use crate::{
    expressions::Expression,
    identifiers::Ident,
    lexer::Token,
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
};

/// `let name = value;`
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Let<'chunk> {
    pub name: Ident,
    pub value: Expression<'chunk>,
}

impl<'chunk> Let<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::KWlet)?;

        let name = Ident::parse(lexer).mark_unrecoverable()?;
        lexer.expecting_token(Token::Equals).mark_unrecoverable()?;
        let value = Expression::parse(lexer, alloc).mark_unrecoverable()?;
        lexer
            .expecting_token(Token::Semicolon)
            .mark_unrecoverable()?;

        Ok(Self { name, value })
    }
}
