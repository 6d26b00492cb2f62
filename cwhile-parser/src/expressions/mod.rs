use internment::Intern;

use crate::{
    errors::ParseErrorExt,
    identifiers::Ident,
    lexer::{
        LexedNumber,
        LexedString,
        Token,
    },
    ASTAllocator,
    ParseError,
    PeekableLexer,
    SyntaxError,
};

pub mod operator;

use self::operator::{
    parse_assignment,
    Assignment,
    BinaryOperator,
    UnaryOperator,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantString(Intern<String>);

impl ConstantString {
    pub fn new(data: String) -> Self {
        Self(Intern::new(data))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for ConstantString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConstantString")
            .field(&self.0.as_str())
            .finish()
    }
}

impl From<&str> for ConstantString {
    fn from(s: &str) -> Self {
        Self::new(s.to_owned())
    }
}

/// `for.index`: the number of completed iterations of the innermost enclosing
/// `for` loop.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct ForIndex;

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Index<'chunk> {
    pub target: Expression<'chunk>,
    pub index: Expression<'chunk>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Call<'chunk> {
    pub function: Ident,
    pub args: &'chunk [Expression<'chunk>],
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Expression<'chunk> {
    Parenthesized(&'chunk Expression<'chunk>),
    Variable(Ident),
    ForIndex(ForIndex),
    Bool(bool),
    Integer(i64),
    String(ConstantString),
    List(&'chunk [Expression<'chunk>]),
    Index(&'chunk Index<'chunk>),
    Call(&'chunk Call<'chunk>),
    UnaryOp(UnaryOperator<'chunk>),
    BinaryOp(BinaryOperator<'chunk>),
    Assign(&'chunk Assignment<'chunk>),
    /// Evaluates every expression in order, producing the last one. Never
    /// produced by the parser.
    Sequence(&'chunk [Expression<'chunk>]),
}

impl<'chunk> Expression<'chunk> {
    pub(crate) fn parse(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        // Assignment sits at the bottom of the precedence tree. Each level parses
        // the next tighter level for its operands, down to `parse_leaf`.
        parse_assignment(lexer, alloc)
    }

    /// Parses `expr { "," expr }`, an empty list is a recoverable error.
    pub(crate) fn parse_list1(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<&'chunk [Self], ParseError> {
        let mut exprs = alloc.new_vec();
        exprs.push(Self::parse(lexer, alloc)?);

        while lexer.next_if_eq(Token::Comma).is_some() {
            exprs.push(Self::parse(lexer, alloc).mark_unrecoverable()?);
        }

        Ok(exprs.into_bump_slice())
    }

    pub(crate) fn parse_list0(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<&'chunk [Self], ParseError> {
        Self::parse_list1(lexer, alloc)
            .recover()
            .map(Option::unwrap_or_default)
    }

    /// Literals, variables, `for.index`, parenthesized expressions and list
    /// constructors.
    pub(crate) fn parse_leaf(
        lexer: &mut PeekableLexer,
        alloc: &'chunk ASTAllocator,
    ) -> Result<Self, ParseError> {
        let token = lexer.next_if(|token| {
            matches!(
                token.as_ref(),
                Token::Ident(_)
                    | Token::Int(_)
                    | Token::String(_)
                    | Token::KWtrue
                    | Token::KWfalse
                    | Token::KWfor
                    | Token::LParen
                    | Token::LBracket
            )
        });

        let token = match token {
            Some(token) => token,
            None => {
                return Err(ParseError::recoverable_from_here(
                    lexer,
                    SyntaxError::ExpectedExpression,
                ))
            }
        };

        Ok(match token.token {
            Token::Ident(ident) => Self::Variable(ident),
            Token::Int(LexedNumber::Int(i)) => Self::Integer(i),
            Token::String(LexedString::Valid(s)) => Self::String(s),
            Token::KWtrue => Self::Bool(true),
            Token::KWfalse => Self::Bool(false),
            Token::KWfor => {
                // `for` in expression position only introduces `for.index`; a
                // `for (` here is a loop statement and not ours to parse.
                lexer.expecting_token(Token::Period).reset_on_err(lexer, token)?;

                let property = Ident::parse(lexer).mark_unrecoverable()?;
                if &*property != "index" {
                    return Err(ParseError::at(
                        token.span,
                        SyntaxError::UnknownLoopProperty(property),
                    ));
                }
                Self::ForIndex(ForIndex)
            }
            Token::LParen => {
                let inner = Self::parse(lexer, alloc).mark_unrecoverable()?;
                lexer
                    .expecting_token(Token::RParen)
                    .mark_unrecoverable()?;
                Self::Parenthesized(alloc.alloc(inner))
            }
            Token::LBracket => {
                let items = Self::parse_list0(lexer, alloc)?;
                lexer
                    .expecting_token(Token::RBracket)
                    .mark_unrecoverable()?;
                Self::List(items)
            }
            _ => unreachable!("lexer rejects malformed literals"),
        })
    }

    /// Whether this expression still contains an extension node.
    pub fn contains_extension(&self) -> bool {
        match self {
            Expression::ForIndex(_) => true,
            Expression::Variable(_)
            | Expression::Bool(_)
            | Expression::Integer(_)
            | Expression::String(_) => false,
            Expression::Parenthesized(expr) => expr.contains_extension(),
            Expression::List(items) | Expression::Sequence(items) => {
                items.iter().any(Expression::contains_extension)
            }
            Expression::Index(index) => {
                index.target.contains_extension() || index.index.contains_extension()
            }
            Expression::Call(call) => call.args.iter().any(Expression::contains_extension),
            Expression::UnaryOp(op) => op.operand().contains_extension(),
            Expression::BinaryOp(op) => op.lhs.contains_extension() || op.rhs.contains_extension(),
            Expression::Assign(assign) => assign.value.contains_extension(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Expression;
    use crate::{
        expressions::{
            ConstantString,
            ForIndex,
            Index,
        },
        identifiers::Ident,
        ASTAllocator,
        SyntaxError,
    };

    #[test]
    pub fn parses_for_index() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("for.index", &alloc) => Expression::parse)?;

        assert_eq!(result, Expression::ForIndex(ForIndex));

        Ok(())
    }

    #[test]
    pub fn rejects_unknown_loop_property() {
        let alloc = ASTAllocator::default();
        let err = final_parser!(("for.value", &alloc) => Expression::parse).unwrap_err();

        assert_eq!(
            err.error.error,
            SyntaxError::UnknownLoopProperty(Ident::from("value"))
        );
    }

    #[test]
    pub fn parses_list_constructor() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!((r#"[2, "x", true]"#, &alloc) => Expression::parse)?;

        assert_eq!(
            result,
            Expression::List(&[
                Expression::Integer(2),
                Expression::String(ConstantString::from("x")),
                Expression::Bool(true),
            ])
        );

        Ok(())
    }

    #[test]
    pub fn parses_empty_list() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("[]", &alloc) => Expression::parse)?;

        assert_eq!(result, Expression::List(&[]));

        Ok(())
    }

    #[test]
    pub fn parses_index_and_call() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();
        let result = final_parser!(("s[len(s)]", &alloc) => Expression::parse)?;

        let Expression::Index(Index { target, index }) = result else {
            panic!("expected an index expression, got {result:?}");
        };
        assert_eq!(*target, Expression::Variable(Ident::from("s")));
        assert!(matches!(index, Expression::Call(call) if &*call.function == "len"));

        Ok(())
    }

    #[test]
    pub fn reports_unclosed_paren() {
        let alloc = ASTAllocator::default();
        let err = final_parser!(("(a + 1", &alloc) => Expression::parse).unwrap_err();

        assert_eq!(err.error.error, SyntaxError::ExpectedToken(crate::lexer::Token::RParen));
    }

    #[test]
    pub fn detects_extension_nodes() -> anyhow::Result<()> {
        let alloc = ASTAllocator::default();

        let with_index = final_parser!(("xs[for.index + 1]", &alloc) => Expression::parse)?;
        let without = final_parser!(("xs[i + 1]", &alloc) => Expression::parse)?;

        assert!(with_index.contains_extension());
        assert!(!without.contains_extension());

        Ok(())
    }
}
