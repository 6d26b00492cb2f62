use logos::{
    Lexer,
    Logos,
};

use crate::{
    expressions::ConstantString,
    identifiers::Ident,
    ParseError,
    SourceSpan,
    SyntaxError,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexedString {
    Valid(ConstantString),
    UnknownEscapeSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexedNumber {
    Int(i64),
    MalformedNumber,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Token {
    #[regex(r"[_A-Za-z][_A-Za-z0-9]*", |lex| Ident::new(lex.slice()))]
    #[strum(serialize = "identifier")]
    Ident(Ident),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[strum(serialize = "string")]
    String(LexedString),

    #[regex(r"[0-9]+", parse_int)]
    #[strum(serialize = "number")]
    Int(LexedNumber),

    #[token("let")]
    #[strum(serialize = "'let'")]
    KWlet,
    #[token("if")]
    #[strum(serialize = "'if'")]
    KWif,
    #[token("else")]
    #[strum(serialize = "'else'")]
    KWelse,
    #[token("while")]
    #[strum(serialize = "'while'")]
    KWwhile,
    #[token("for")]
    #[strum(serialize = "'for'")]
    KWfor,
    #[token("continue")]
    #[strum(serialize = "'continue'")]
    KWcontinue,
    #[token("break")]
    #[strum(serialize = "'break'")]
    KWbreak,
    #[token("catch")]
    #[strum(serialize = "'catch'")]
    KWcatch,
    #[token("return")]
    #[strum(serialize = "'return'")]
    KWreturn,
    #[token("true")]
    #[strum(serialize = "'true'")]
    KWtrue,
    #[token("false")]
    #[strum(serialize = "'false'")]
    KWfalse,

    #[token("(")]
    #[strum(serialize = "'('")]
    LParen,
    #[token(")")]
    #[strum(serialize = "')'")]
    RParen,
    #[token("{")]
    #[strum(serialize = "'{'")]
    LBrace,
    #[token("}")]
    #[strum(serialize = "'}'")]
    RBrace,
    #[token("[")]
    #[strum(serialize = "'['")]
    LBracket,
    #[token("]")]
    #[strum(serialize = "']'")]
    RBracket,

    #[token(";")]
    #[strum(serialize = "';'")]
    Semicolon,
    #[token(":")]
    #[strum(serialize = "':'")]
    Colon,
    #[token(",")]
    #[strum(serialize = "','")]
    Comma,
    #[token(".")]
    #[strum(serialize = "'.'")]
    Period,

    #[token("+")]
    #[strum(serialize = "'+'")]
    Plus,
    #[token("-")]
    #[strum(serialize = "'-'")]
    Minus,
    #[token("*")]
    #[strum(serialize = "'*'")]
    Star,
    #[token("/")]
    #[strum(serialize = "'/'")]
    Slash,
    #[token("%")]
    #[strum(serialize = "'%'")]
    Percent,
    #[token("!")]
    #[strum(serialize = "'!'")]
    Bang,

    #[token("=")]
    #[strum(serialize = "'='")]
    Equals,
    #[token("+=")]
    #[strum(serialize = "'+='")]
    PlusEquals,
    #[token("-=")]
    #[strum(serialize = "'-='")]
    MinusEquals,
    #[token("==")]
    #[strum(serialize = "'=='")]
    DoubleEquals,
    #[token("!=")]
    #[strum(serialize = "'!='")]
    BangEquals,
    #[token("<")]
    #[strum(serialize = "'<'")]
    LeftAngle,
    #[token(">")]
    #[strum(serialize = "'>'")]
    RightAngle,
    #[token("<=")]
    #[strum(serialize = "'<='")]
    LeftAngleEquals,
    #[token(">=")]
    #[strum(serialize = "'>='")]
    RightAngleEquals,
    #[token("&&")]
    #[strum(serialize = "'&&'")]
    DoubleAmpersand,
    #[token("||")]
    #[strum(serialize = "'||'")]
    DoublePipe,

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    #[strum(serialize = "unrecognized input")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpannedToken {
    pub(crate) token: Token,
    pub(crate) span: SourceSpan,
    /// Index of this token in the token stream.
    pub(crate) pos: usize,
}

impl AsRef<Token> for SpannedToken {
    fn as_ref(&self) -> &Token {
        &self.token
    }
}

impl PartialEq<Token> for SpannedToken {
    fn eq(&self, other: &Token) -> bool {
        self.token == *other
    }
}

/// Lexes the full input up front. Malformed tokens are reported immediately
/// since no production can accept them.
pub(crate) fn tokenize(src: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Token::lexer(src);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        let span = SourceSpan::from(lexer.span());
        let error = match token {
            Token::Error => Some(SyntaxError::UnrecognizedToken),
            Token::String(LexedString::UnknownEscapeSequence) => {
                Some(SyntaxError::InvalidEscapeSequence)
            }
            Token::Int(LexedNumber::MalformedNumber) => Some(SyntaxError::MalformedNumber),
            _ => None,
        };

        if let Some(error) = error {
            return Err(ParseError::at(span, error));
        }

        tokens.push(SpannedToken {
            token,
            span,
            pos: tokens.len(),
        });
    }

    Ok(tokens)
}

fn parse_int(lexer: &mut Lexer<Token>) -> LexedNumber {
    lexer
        .slice()
        .parse()
        .map(LexedNumber::Int)
        .unwrap_or(LexedNumber::MalformedNumber)
}

fn parse_string(lexer: &mut Lexer<Token>) -> LexedString {
    let span = lexer.slice();
    // Strip the quotes, the regex guarantees both are present.
    let body = &span[1..span.len() - 1];

    let mut string = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            string.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => string.push('\n'),
            Some('t') => string.push('\t'),
            Some('r') => string.push('\r'),
            Some('0') => string.push('\0'),
            Some('\\') => string.push('\\'),
            Some('"') => string.push('"'),
            Some('\'') => string.push('\''),
            _ => return LexedString::UnknownEscapeSequence,
        }
    }

    LexedString::Valid(ConstantString::new(string))
}
