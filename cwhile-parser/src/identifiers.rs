use std::ops::Deref;

use internment::Intern;

use crate::{
    lexer::Token,
    ParseError,
    PeekableLexer,
    SyntaxError,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident(Intern<String>);

impl Deref for Ident {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl Ident {
    pub fn new(name: &str) -> Self {
        Self(Intern::new(name.to_owned()))
    }

    pub(crate) fn parse(lexer: &mut PeekableLexer) -> Result<Self, ParseError> {
        match lexer.peek().map(|token| token.token) {
            Some(Token::Ident(ident)) => {
                lexer.next_if(|_| true);
                Ok(ident)
            }
            _ => Err(ParseError::recoverable_from_here(
                lexer,
                SyntaxError::ExpectedToken(Token::Ident(Ident::new("_"))),
            )),
        }
    }
}

impl std::fmt::Debug for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Ident").field(&self.0.as_str()).finish()
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
