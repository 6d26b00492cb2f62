use crate::{
    lexer::Token,
    statement::Statement,
    ASTAllocator,
    ParseError,
    ParseErrorExt,
    PeekableLexer,
    SyntaxError,
};

#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Block<'chunk> {
    pub statements: &'chunk [Statement<'chunk>],
}

impl<'chunk> Block<'chunk> {
    /// `{ statement* }`
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        lexer.expecting_token(Token::LBrace)?;

        let mut statements = alloc.new_vec();
        while lexer.next_if_eq(Token::RBrace).is_none() {
            if lexer.at_eof() {
                return Err(ParseError::unrecoverable_from_here(
                    lexer,
                    SyntaxError::ExpectedToken(Token::RBrace),
                ));
            }
            statements.push(Statement::parse(lexer, alloc).mark_unrecoverable()?);
        }

        Ok(Self {
            statements: statements.into_bump_slice(),
        })
    }

    /// The body of a compound statement. A lone statement is wrapped into a
    /// block of its own so every body has the same shape.
    pub(crate) fn parse_body(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        if let Some(block) = Self::parse(lexer, alloc).recover()? {
            return Ok(block);
        }

        match Statement::parse(lexer, alloc).recover()? {
            Some(statement) => Ok(Self {
                statements: alloc.alloc_slice([statement]),
            }),
            None => Err(ParseError::unrecoverable_from_here(
                lexer,
                SyntaxError::ExpectedBody,
            )),
        }
    }

    /// Whether any extension node (`continue while`, `for.index` or a range
    /// loop) is left anywhere in this block.
    pub fn contains_extension(&self) -> bool {
        self.statements.iter().any(Statement::contains_extension)
    }
}
