use cwhile_parser::{
    expressions::{
        operator::{
            AssignOp,
            Assignment,
            BinaryKind,
            BinaryOperator,
        },
        Expression,
    },
    identifiers::Ident,
    statement::{
        variables::Let,
        Statement,
    },
    ASTAllocator,
};

pub(crate) mod scope;

use self::scope::BindingScope;
use crate::{
    index::{
        IndexBindings,
        LoopKey,
    },
    DesugarError,
    LoopDefect,
};

/// Hands out identifiers for synthesized variables.
#[derive(Debug, Default)]
pub(crate) struct NameGenerator {
    next: usize,
}

impl NameGenerator {
    /// `$` never appears in a lexed identifier, so generated names cannot
    /// collide with user variables.
    pub(crate) fn fresh(&mut self, hint: &str) -> Ident {
        let name = Ident::new(&format!("{hint}${}", self.next));
        self.next += 1;
        name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopKind {
    For,
    Range,
    While,
    ContinueWhile,
}

/// A loop being lowered, as seen from a `continue while` directly inside it.
/// `condition` and `iterate` are already lowered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopFrame<'chunk> {
    pub(crate) kind: LoopKind,
    pub(crate) condition: Option<Expression<'chunk>>,
    pub(crate) iterate: Option<Expression<'chunk>>,
}

impl<'chunk> LoopFrame<'chunk> {
    /// The `(condition, iterate)` pair an inner loop borrows.
    pub(crate) fn contract(&self) -> Result<(Expression<'chunk>, Expression<'chunk>), LoopDefect> {
        match (self.condition, self.iterate) {
            (Some(condition), Some(iterate)) => Ok((condition, iterate)),
            (None, _) => Err(LoopDefect::MissingCondition),
            (_, None) => Err(LoopDefect::MissingIterate),
        }
    }
}

pub(crate) struct Desugarer<'chunk> {
    alloc: &'chunk ASTAllocator,
    names: NameGenerator,
    counters: IndexBindings,

    /// Enclosing loops, innermost last.
    frames: Vec<LoopFrame<'chunk>>,
    /// Per frame, the flag `while` loops inside it test to leave it.
    exits: Vec<Option<Ident>>,
    /// Counter of each enclosing `for`/range loop, innermost last. `None` for
    /// loops whose body never reads `for.index`.
    indexes: Vec<Option<Ident>>,
    /// Element bindings of enclosing range loops, mapped to the expression
    /// reading the current element.
    aliases: BindingScope<Expression<'chunk>>,
}

impl<'chunk> Desugarer<'chunk> {
    pub(crate) fn new(
        alloc: &'chunk ASTAllocator,
        names: NameGenerator,
        counters: IndexBindings,
    ) -> Self {
        Self {
            alloc,
            names,
            counters,
            frames: Default::default(),
            exits: Default::default(),
            indexes: Default::default(),
            aliases: Default::default(),
        }
    }

    pub(crate) fn alloc(&self) -> &'chunk ASTAllocator {
        self.alloc
    }

    pub(crate) fn fresh_name(&mut self, hint: &str) -> Ident {
        self.names.fresh(hint)
    }

    pub(crate) fn counter_for(&self, key: LoopKey) -> Option<Ident> {
        self.counters.counter(key)
    }

    /// The counter `for.index` currently resolves to.
    pub(crate) fn current_index(&self) -> Option<Ident> {
        self.indexes.last().copied().flatten()
    }

    /// The loop a `continue while` here borrows from. `while` loops have
    /// nothing to lend and are looked through.
    fn host_slot(&self) -> Option<usize> {
        self.frames
            .iter()
            .rposition(|frame| frame.kind != LoopKind::While)
    }

    pub(crate) fn host(&self) -> Option<LoopFrame<'chunk>> {
        self.host_slot().map(|slot| self.frames[slot])
    }

    pub(crate) fn in_while(&self) -> bool {
        matches!(self.frames.last(), Some(frame) if frame.kind == LoopKind::While)
    }

    /// The flag a `continue while` sets before leaving its host from inside
    /// `while` loops. `None` when it sits directly in the host.
    pub(crate) fn exit_flag(&mut self) -> Option<Ident> {
        let slot = self.host_slot()?;
        if slot + 1 == self.frames.len() {
            return None;
        }

        let names = &mut self.names;
        Some(*self.exits[slot].get_or_insert_with(|| names.fresh("exit")))
    }

    /// The host's exit flag if a `continue while` has asked for one.
    pub(crate) fn pending_exit_flag(&self) -> Option<Ident> {
        self.host_slot().and_then(|slot| self.exits[slot])
    }

    /// Like [`Self::pending_exit_flag`], but the next `while` in the host
    /// starts without a flag.
    pub(crate) fn take_exit_flag(&mut self) -> Option<Ident> {
        let slot = self.host_slot()?;
        self.exits[slot].take()
    }

    pub(crate) fn alias(&self, name: Ident) -> Option<Expression<'chunk>> {
        self.aliases.lookup(name)
    }

    /// Whether lowering an expression can change it at all.
    pub(crate) fn rewrites_expression(&self, expr: &Expression) -> bool {
        !self.aliases.is_empty() || expr.contains_extension()
    }

    pub(crate) fn bind_alias(&mut self, name: Ident, element: Expression<'chunk>) {
        self.aliases.bind(name, element);
    }

    pub(crate) fn declare(&mut self, name: Ident) {
        self.aliases.shadow(name);
    }

    pub(crate) fn aliases_mark(&self) -> usize {
        self.aliases.mark()
    }

    pub(crate) fn restore_aliases(&mut self, mark: usize) {
        self.aliases.restore(mark);
    }

    /// Runs `f` with declarations made inside it scoped to it.
    pub(crate) fn with_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, DesugarError>,
    ) -> Result<T, DesugarError> {
        let mark = self.aliases.mark();
        let result = f(&mut *self);
        self.aliases.restore(mark);
        result
    }

    /// Runs `f` inside `frame`. `index` is pushed only for loops `for.index`
    /// can refer to.
    pub(crate) fn in_loop<T>(
        &mut self,
        frame: LoopFrame<'chunk>,
        index: Option<Option<Ident>>,
        f: impl FnOnce(&mut Self) -> Result<T, DesugarError>,
    ) -> Result<T, DesugarError> {
        self.frames.push(frame);
        self.exits.push(None);
        if let Some(index) = index {
            self.indexes.push(index);
        }

        let result = f(&mut *self);

        self.frames.pop();
        self.exits.pop();
        if index.is_some() {
            self.indexes.pop();
        }
        result
    }
}

/// `name = name + 1`
pub(crate) fn increment<'chunk>(alloc: &'chunk ASTAllocator, name: Ident) -> Expression<'chunk> {
    Expression::Assign(alloc.alloc(Assignment {
        target: name,
        op: AssignOp::Set,
        value: Expression::BinaryOp(BinaryOperator::new(
            alloc,
            BinaryKind::Plus,
            Expression::Variable(name),
            Expression::Integer(1),
        )),
    }))
}

/// Appends the counter increment to a loop's iterate expression.
pub(crate) fn counted_iterate<'chunk>(
    alloc: &'chunk ASTAllocator,
    iterate: Option<Expression<'chunk>>,
    counter: Option<Ident>,
) -> Option<Expression<'chunk>> {
    let counter = match counter {
        Some(counter) => counter,
        None => return iterate,
    };

    let bump = increment(alloc, counter);
    Some(match iterate {
        Some(iterate) => Expression::Sequence(alloc.alloc_slice([iterate, bump])),
        None => bump,
    })
}

/// `let name = 0;`
pub(crate) fn declare_counter<'chunk>(
    alloc: &'chunk ASTAllocator,
    counter: Ident,
) -> Statement<'chunk> {
    Statement::Let(alloc.alloc(Let {
        name: counter,
        value: Expression::Integer(0),
    }))
}
