use bumpalo::{
    collections::Vec as BumpVec,
    Bump,
};
use tracing::instrument;

#[cfg(test)]
macro_rules! final_parser {
    (($src:expr, $alloc:expr) => $parser:expr) => {
        (|| -> Result<_, $crate::ChunkParseError> {
            let mut lexer = $crate::PeekableLexer::new($src)?;
            let result = $parser(&mut lexer, $alloc)?;
            lexer.expect_eof()?;
            Ok(result)
        })()
    };
}

pub mod block;
pub mod expressions;
pub mod identifiers;
pub mod statement;

mod errors;
mod lexer;

pub use self::{
    errors::{
        ChunkParseError,
        ParseError,
        SyntaxError,
    },
    lexer::Token,
};
use self::{
    block::Block,
    errors::ParseErrorExt,
    lexer::SpannedToken,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "bytes: {}..{}", start, end)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl From<std::ops::Range<usize>> for SourceSpan {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// Owns every node of a parsed or synthesized tree. Nodes refer to each other
/// with `&'chunk` borrows, so a subtree can appear in several places of a
/// rewritten tree without being copied.
#[derive(Debug)]
pub struct ASTAllocator(Bump);

impl ASTAllocator {
    #[allow(clippy::mut_from_ref)] // I think bumpalo knows what it's doing
    pub fn alloc<T>(&self, val: T) -> &mut T {
        self.0.alloc(val)
    }

    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice<T, I>(&self, items: I) -> &mut [T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.0.alloc_slice_fill_iter(items)
    }

    pub fn new_vec<T>(&self) -> BumpVec<'_, T> {
        BumpVec::new_in(&self.0)
    }
}

impl Default for ASTAllocator {
    fn default() -> Self {
        Self(Bump::new())
    }
}

/// A fully lexed token stream with backtracking support.
pub(crate) struct PeekableLexer {
    tokens: Vec<SpannedToken>,
    cursor: usize,
    eof: SourceSpan,
}

impl PeekableLexer {
    pub(crate) fn new(src: &str) -> Result<Self, ParseError> {
        let tokens = lexer::tokenize(src)?;

        Ok(Self {
            tokens,
            cursor: 0,
            eof: SourceSpan::from(src.len()..src.len()),
        })
    }

    pub(crate) fn peek(&self) -> Option<&SpannedToken> {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&SpannedToken> {
        self.tokens.get(self.cursor + n)
    }

    pub(crate) fn next_if(
        &mut self,
        pred: impl FnOnce(&SpannedToken) -> bool,
    ) -> Option<SpannedToken> {
        let token = *self.peek().filter(|token| pred(token))?;
        self.cursor += 1;
        Some(token)
    }

    pub(crate) fn next_if_eq(&mut self, expected: Token) -> Option<SpannedToken> {
        self.next_if(|token| *token == expected)
    }

    pub(crate) fn expecting_token(&mut self, expected: Token) -> Result<SpannedToken, ParseError> {
        self.next_if_eq(expected).ok_or_else(|| {
            ParseError::recoverable_from_here(self, SyntaxError::ExpectedToken(expected))
        })
    }

    /// Rewinds the stream so that `token` is the next token produced.
    pub(crate) fn reset(&mut self, token: SpannedToken) {
        self.cursor = token.pos;
    }

    pub(crate) fn current_span(&self) -> SourceSpan {
        self.peek().map(|token| token.span).unwrap_or(self.eof)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    pub(crate) fn expect_eof(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ParseError::unrecoverable_from_here(
                self,
                SyntaxError::ExpectedEOF(token.token),
            )),
        }
    }
}

/// Parses a whole source text into its top-level block.
#[instrument(level = "trace", name = "parse_chunk", skip(input, alloc), fields(src_bytes = input.len()))]
pub fn parse_chunk<'chunk>(
    input: &str,
    alloc: &'chunk ASTAllocator,
) -> Result<Block<'chunk>, ChunkParseError> {
    let mut lexer = PeekableLexer::new(input)?;

    let mut statements = alloc.new_vec();
    while !lexer.at_eof() {
        let statement = statement::Statement::parse(&mut lexer, alloc).mark_unrecoverable()?;
        statements.push(statement);
    }

    Ok(Block {
        statements: statements.into_bump_slice(),
    })
}
