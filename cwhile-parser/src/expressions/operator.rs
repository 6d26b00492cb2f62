use crate::{
    errors::ParseErrorExt,
    expressions::{
        Call,
        Expression,
        Index,
    },
    identifiers::Ident,
    lexer::Token,
    ASTAllocator,
    ParseError,
    PeekableLexer,
    SyntaxError,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryKind {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equals,
    NotEqual,
    And,
    Or,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BinaryOperator<'chunk> {
    pub kind: BinaryKind,
    pub lhs: &'chunk Expression<'chunk>,
    pub rhs: &'chunk Expression<'chunk>,
}

impl<'chunk> BinaryOperator<'chunk> {
    pub fn new(
        alloc: &'chunk ASTAllocator,
        kind: BinaryKind,
        lhs: Expression<'chunk>,
        rhs: Expression<'chunk>,
    ) -> Self {
        Self {
            kind,
            lhs: alloc.alloc(lhs),
            rhs: alloc.alloc(rhs),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator<'chunk> {
    Not(&'chunk Expression<'chunk>),
    Minus(&'chunk Expression<'chunk>),
}

impl<'chunk> UnaryOperator<'chunk> {
    pub fn operand(&self) -> &'chunk Expression<'chunk> {
        match self {
            UnaryOperator::Not(expr) | UnaryOperator::Minus(expr) => expr,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AssignOp {
    Set,
    Add,
    Subtract,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Assignment<'chunk> {
    pub target: Ident,
    pub op: AssignOp,
    pub value: Expression<'chunk>,
}

/// `target (= | += | -=) value`, right associative.
pub(crate) fn parse_assignment<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    let target = parse_or(lexer, alloc)?;

    let op = match lexer.next_if(|token| {
        matches!(
            token.as_ref(),
            Token::Equals | Token::PlusEquals | Token::MinusEquals
        )
    }) {
        Some(token) => match token.token {
            Token::Equals => AssignOp::Set,
            Token::PlusEquals => AssignOp::Add,
            Token::MinusEquals => AssignOp::Subtract,
            _ => unreachable!(),
        },
        None => return Ok(target),
    };

    let target = match target {
        Expression::Variable(ident) => ident,
        _ => {
            return Err(ParseError::unrecoverable_from_here(
                lexer,
                SyntaxError::InvalidAssignmentTarget,
            ))
        }
    };

    let value = parse_assignment(lexer, alloc).mark_unrecoverable()?;

    Ok(Expression::Assign(alloc.alloc(Assignment { target, op, value })))
}

/// Parses one left-associative precedence level: `next { op next }`.
fn parse_left_assoc_binop<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
    next: fn(&mut PeekableLexer, &'chunk ASTAllocator) -> Result<Expression<'chunk>, ParseError>,
    match_op: impl Fn(&Token) -> Option<BinaryKind>,
) -> Result<Expression<'chunk>, ParseError> {
    let mut lhs = next(lexer, alloc)?;

    while let Some(kind) = lexer.peek().and_then(|token| match_op(token.as_ref())) {
        lexer.next_if(|_| true);
        let rhs = next(lexer, alloc).mark_unrecoverable()?;
        lhs = Expression::BinaryOp(BinaryOperator::new(alloc, kind, lhs, rhs));
    }

    Ok(lhs)
}

fn parse_or<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    parse_left_assoc_binop(lexer, alloc, parse_and, |token| match token {
        Token::DoublePipe => Some(BinaryKind::Or),
        _ => None,
    })
}

fn parse_and<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    parse_left_assoc_binop(lexer, alloc, parse_equality, |token| match token {
        Token::DoubleAmpersand => Some(BinaryKind::And),
        _ => None,
    })
}

fn parse_equality<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    parse_left_assoc_binop(lexer, alloc, parse_comparison, |token| match token {
        Token::DoubleEquals => Some(BinaryKind::Equals),
        Token::BangEquals => Some(BinaryKind::NotEqual),
        _ => None,
    })
}

fn parse_comparison<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    parse_left_assoc_binop(lexer, alloc, parse_addsub, |token| match token {
        Token::LeftAngle => Some(BinaryKind::LessThan),
        Token::LeftAngleEquals => Some(BinaryKind::LessEqual),
        Token::RightAngle => Some(BinaryKind::GreaterThan),
        Token::RightAngleEquals => Some(BinaryKind::GreaterEqual),
        _ => None,
    })
}

fn parse_addsub<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    parse_left_assoc_binop(lexer, alloc, parse_muldivmod, |token| match token {
        Token::Plus => Some(BinaryKind::Plus),
        Token::Minus => Some(BinaryKind::Minus),
        _ => None,
    })
}

fn parse_muldivmod<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    parse_left_assoc_binop(lexer, alloc, parse_unary, |token| match token {
        Token::Star => Some(BinaryKind::Times),
        Token::Slash => Some(BinaryKind::Divide),
        Token::Percent => Some(BinaryKind::Modulo),
        _ => None,
    })
}

fn parse_unary<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    let token = match lexer.next_if(|token| matches!(token.as_ref(), Token::Bang | Token::Minus)) {
        Some(token) => token,
        None => return parse_postfix(lexer, alloc),
    };

    let operand = alloc.alloc(parse_unary(lexer, alloc).mark_unrecoverable()?);
    Ok(Expression::UnaryOp(match token.token {
        Token::Bang => UnaryOperator::Not(operand),
        _ => UnaryOperator::Minus(operand),
    }))
}

/// A leaf followed by any number of `[index]` suffixes. A leaf variable
/// directly followed by `(` is a builtin call.
fn parse_postfix<'chunk>(
    lexer: &mut PeekableLexer,
    alloc: &'chunk ASTAllocator,
) -> Result<Expression<'chunk>, ParseError> {
    let mut expr = Expression::parse_leaf(lexer, alloc)?;

    if let Expression::Variable(function) = expr {
        if lexer.next_if_eq(Token::LParen).is_some() {
            let args = Expression::parse_list0(lexer, alloc)?;
            lexer
                .expecting_token(Token::RParen)
                .mark_unrecoverable()?;
            expr = Expression::Call(alloc.alloc(Call { function, args }));
        }
    }

    while lexer.next_if_eq(Token::LBracket).is_some() {
        let index = Expression::parse(lexer, alloc).mark_unrecoverable()?;
        lexer
            .expecting_token(Token::RBracket)
            .mark_unrecoverable()?;
        expr = Expression::Index(alloc.alloc(Index {
            target: expr,
            index,
        }));
    }

    Ok(expr)
}
