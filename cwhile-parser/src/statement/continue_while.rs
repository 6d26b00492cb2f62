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

/// `continue while (cond) body [else else_body] [catch catch_body]`
///
/// Runs `body` for as long as both `cond` and the enclosing loop's condition
/// hold, advancing the enclosing loop after every cycle. `catch_body` runs
/// when the enclosing loop ran out first, `else_body` otherwise.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ContinueWhile<'chunk> {
    pub cond: Expression<'chunk>,
    pub body: Block<'chunk>,
    pub else_body: Option<Block<'chunk>>,
    pub catch_body: Option<Block<'chunk>>,
}

impl<'chunk> ContinueWhile<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        let continue_kw = lexer.expecting_token(Token::KWcontinue)?;
        lexer
            .expecting_token(Token::KWwhile)
            .reset_on_err(lexer, continue_kw)?;

        let cond = parse_condition(lexer, alloc).mark_unrecoverable()?;
        let body = Block::parse_body(lexer, alloc).mark_unrecoverable()?;

        let else_body = match lexer.next_if_eq(Token::KWelse) {
            Some(_) => Some(Block::parse_body(lexer, alloc).mark_unrecoverable()?),
            None => None,
        };
        let catch_body = match lexer.next_if_eq(Token::KWcatch) {
            Some(_) => Some(Block::parse_body(lexer, alloc).mark_unrecoverable()?),
            None => None,
        };

        Ok(Self {
            cond,
            body,
            else_body,
            catch_body,
        })
    }
}
