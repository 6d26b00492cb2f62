use crate::{
    block::Block,
    expressions::Expression,
    lexer::Token,
    statement::while_loop::parse_condition,
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
};

/// `if (cond) body [else else_final]`. An `else if` chain nests in
/// `else_final`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct If<'chunk> {
    pub cond: Expression<'chunk>,
    pub body: Block<'chunk>,
    pub else_final: Option<Block<'chunk>>,
}

impl<'chunk> If<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::KWif)?;

        let cond = parse_condition(lexer, alloc).mark_unrecoverable()?;
        let body = Block::parse_body(lexer, alloc).mark_unrecoverable()?;

        let else_final = match lexer.next_if_eq(Token::KWelse) {
            Some(_) => Some(Block::parse_body(lexer, alloc).mark_unrecoverable()?),
            None => None,
        };

        Ok(Self {
            cond,
            body,
            else_final,
        })
    }
}
