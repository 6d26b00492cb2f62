use thiserror::Error;

use crate::{
    lexer::Token,
    PeekableLexer,
    SourceSpan,
};

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum SyntaxError {
    #[error("Expected an expression")]
    ExpectedExpression,
    #[error("Expected a statement")]
    ExpectedStatement,
    #[error("Expected a block or a statement as loop body")]
    ExpectedBody,
    #[error("Only variables can be assigned to")]
    InvalidAssignmentTarget,
    #[error("Only `let` declarations and expressions may initialize a for loop")]
    InvalidForInit,
    #[error("Unrecognized token")]
    UnrecognizedToken,
    #[error("Unrecognized escape sequence in string")]
    InvalidEscapeSequence,
    #[error("Malformed number")]
    MalformedNumber,
    #[error("Unknown loop property `for.{0}`, expected `for.index`")]
    UnknownLoopProperty(crate::identifiers::Ident),
    #[error("Expected {0:}")]
    ExpectedToken(Token),
    #[error("Expected {0:} or {1:}")]
    ExpectedToken2(Token, Token),
    #[error("Expected end of file, found: {0:}")]
    ExpectedEOF(Token),
}

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub struct ParseError {
    pub error: SyntaxError,
    pub location: SourceSpan,
    pub(crate) recoverable: bool,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Error: {} at {}", self.error, self.location))
    }
}

impl ParseError {
    /// An error that only means "this alternative doesn't apply here". Nothing
    /// was consumed, so the caller may try another production.
    pub(crate) fn recoverable_from_here(lexer: &PeekableLexer, err: SyntaxError) -> Self {
        Self {
            error: err,
            location: lexer.current_span(),
            recoverable: true,
        }
    }

    pub(crate) fn unrecoverable_from_here(lexer: &PeekableLexer, err: SyntaxError) -> Self {
        Self {
            error: err,
            location: lexer.current_span(),
            recoverable: false,
        }
    }

    pub(crate) fn at(location: SourceSpan, err: SyntaxError) -> Self {
        Self {
            error: err,
            location,
            recoverable: false,
        }
    }
}

pub(crate) trait ParseErrorExt<T> {
    /// Turns a recoverable error into `Ok(None)`.
    fn recover(self) -> Result<Option<T>, ParseError>;

    /// Runs `alternative` if this result is a recoverable error.
    fn recover_with(
        self,
        alternative: impl FnOnce() -> Result<T, ParseError>,
    ) -> Result<T, ParseError>;

    fn mark_unrecoverable(self) -> Result<T, ParseError>;

    /// Rewinds the lexer to `token` when this result is a recoverable error.
    fn reset_on_err(
        self,
        lexer: &mut PeekableLexer,
        token: crate::lexer::SpannedToken,
    ) -> Result<T, ParseError>;
}

impl<T> ParseErrorExt<T> for Result<T, ParseError> {
    fn recover(self) -> Result<Option<T>, ParseError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.recoverable => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn recover_with(
        self,
        alternative: impl FnOnce() -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        match self {
            Err(e) if e.recoverable => alternative(),
            other => other,
        }
    }

    fn mark_unrecoverable(self) -> Result<T, ParseError> {
        self.map_err(|e| ParseError {
            recoverable: false,
            ..e
        })
    }

    fn reset_on_err(
        self,
        lexer: &mut PeekableLexer,
        token: crate::lexer::SpannedToken,
    ) -> Result<T, ParseError> {
        if matches!(&self, Err(e) if e.recoverable) {
            lexer.reset(token);
        }
        self
    }
}

#[derive(Debug, Error)]
#[error("Errors parsing chunk: {error:#}")]
pub struct ChunkParseError {
    pub error: ParseError,
}

impl From<ParseError> for ChunkParseError {
    fn from(error: ParseError) -> Self {
        ChunkParseError { error }
    }
}

#[cfg(feature = "rendered-errors")]
impl ChunkParseError {
    pub fn build_report(&self) -> ariadne::Report<std::ops::Range<usize>> {
        use ariadne::{
            Label,
            Report,
            ReportKind,
        };

        let (range, label) = (self.error.location, self.error.error);

        Report::build(ReportKind::Error, (), range.start)
            .with_message("Failed to parse source")
            .with_label(Label::new(range.start..range.end).with_message(label))
            .finish()
    }
}
