use crate::{
    block::Block,
    expressions::Expression,
    lexer::Token,
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
};

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct WhileLoop<'chunk> {
    pub cond: Expression<'chunk>,
    pub body: Block<'chunk>,
}

impl<'chunk> WhileLoop<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::KWwhile)?;

        let cond = parse_condition(lexer, alloc).mark_unrecoverable()?;
        let body = Block::parse_body(lexer, alloc).mark_unrecoverable()?;

        Ok(Self { cond, body })
    }
}

/// `( expr )`, shared by every statement with a parenthesized condition.
pub(crate) fn parse_condition<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    lexer.expecting_token(Token::LParen)?;
    let cond = Expression::parse(lexer, alloc).mark_unrecoverable()?;
    lexer
        .expecting_token(Token::RParen)
        .mark_unrecoverable()?;

    Ok(cond)
}
