use cwhile_parser::{
    block::Block,
    expressions::Expression,
    statement::{
        for_loop::ForLoop,
        Statement,
    },
};
use tracing::instrument;

use crate::{
    engine::scope::BindingScope,
    LoopDefect,
    MalformedLoopExtension,
    OutOfScopeLoopVariable,
};

/// What a `continue while` at the current position would borrow from.
#[derive(Debug, Clone, Copy)]
enum Host {
    Outside,
    Borrowable,
    Defective(LoopDefect),
}

impl Host {
    fn of_for(for_loop: &ForLoop) -> Self {
        if !for_loop.has_condition() {
            Host::Defective(LoopDefect::MissingCondition)
        } else if !for_loop.has_iterate() {
            Host::Defective(LoopDefect::MissingIterate)
        } else {
            Host::Borrowable
        }
    }
}

/// Checks that the innermost `for` or range loop around every `continue while`
/// in `for_loop` has both a condition and an iterate expression to borrow.
/// `while` loops in between are looked through.
#[instrument(level = "trace", name = "validate", skip_all)]
pub fn validate(for_loop: &ForLoop) -> Result<(), MalformedLoopExtension> {
    validate_body(&for_loop.body, Host::of_for(for_loop))
}

pub(crate) fn validate_statement(statement: &Statement) -> Result<(), MalformedLoopExtension> {
    validate_in(statement, Host::Outside)
}

pub(crate) fn validate_block(block: &Block) -> Result<(), MalformedLoopExtension> {
    validate_body(block, Host::Outside)
}

fn validate_body(block: &Block, host: Host) -> Result<(), MalformedLoopExtension> {
    block
        .statements
        .iter()
        .try_for_each(|statement| validate_in(statement, host))
}

fn validate_in(statement: &Statement, host: Host) -> Result<(), MalformedLoopExtension> {
    match statement {
        Statement::ContinueWhile(stat) => {
            match host {
                Host::Outside => return Err(LoopDefect::NoEnclosingLoop.into()),
                Host::Defective(defect) => return Err(defect.into()),
                Host::Borrowable => (),
            }

            // The inner loop carries a full contract of its own.
            validate_body(&stat.body, Host::Borrowable)?;
            for handler in [&stat.else_body, &stat.catch_body].into_iter().flatten() {
                validate_body(handler, host)?;
            }
            Ok(())
        }
        Statement::For(stat) => validate_body(&stat.body, Host::of_for(stat)),
        Statement::ForRange(stat) => validate_body(&stat.body, Host::Borrowable),
        // A `while` has nothing to lend, so the host stays the loop around it.
        Statement::While(stat) => validate_body(&stat.body, host),
        Statement::If(stat) => {
            validate_body(&stat.body, host)?;
            match &stat.else_final {
                Some(else_final) => validate_body(else_final, host),
                None => Ok(()),
            }
        }
        Statement::Block(block) => validate_body(block, host),
        Statement::Empty(_)
        | Statement::Let(_)
        | Statement::Expression(_)
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Return(_) => Ok(()),
    }
}

/// Checks the reads of loop-derived variables: `for.index` needs an enclosing
/// `for` loop, and the `else`/`catch` bodies of a `continue while` hosted by a
/// range loop may not read that loop's element binding.
#[instrument(level = "trace", name = "check_scopes", skip_all)]
pub fn check_scopes(for_loop: &ForLoop) -> Result<(), OutOfScopeLoopVariable> {
    ScopeChecker::default().check_statement(&Statement::For(for_loop), Context::default())
}

pub(crate) fn check_statement_scopes(statement: &Statement) -> Result<(), OutOfScopeLoopVariable> {
    ScopeChecker::default().check_statement(statement, Context::default())
}

pub(crate) fn check_block_scopes(block: &Block) -> Result<(), OutOfScopeLoopVariable> {
    ScopeChecker::default().check_block(block, Context::default())
}

#[derive(Debug, Default, Clone, Copy)]
struct Context {
    in_for: bool,
    /// Element binding guarded by the innermost host loop's condition.
    host_element: Option<usize>,
    /// Element binding that may not be read here.
    forbidden: Option<usize>,
}

#[derive(Debug, Default)]
struct ScopeChecker {
    /// Range loop element bindings in scope, each with a unique id so a
    /// rebinding of the same name is told apart.
    elements: BindingScope<usize>,
    next_element: usize,
}

impl ScopeChecker {
    fn check_block(&mut self, block: &Block, ctx: Context) -> Result<(), OutOfScopeLoopVariable> {
        let mark = self.elements.mark();
        let result = block
            .statements
            .iter()
            .try_for_each(|statement| self.check_statement(statement, ctx));
        self.elements.restore(mark);

        result
    }

    fn check_statement(
        &mut self,
        statement: &Statement,
        ctx: Context,
    ) -> Result<(), OutOfScopeLoopVariable> {
        match statement {
            Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => Ok(()),
            Statement::Let(decl) => {
                self.check_expr(&decl.value, ctx)?;
                self.elements.shadow(decl.name);
                Ok(())
            }
            Statement::Expression(expr) => self.check_expr(expr, ctx),
            Statement::Return(ret) => ret
                .values
                .iter()
                .try_for_each(|value| self.check_expr(value, ctx)),
            Statement::Block(block) => self.check_block(block, ctx),
            Statement::If(stat) => {
                self.check_expr(&stat.cond, ctx)?;
                self.check_block(&stat.body, ctx)?;
                match &stat.else_final {
                    Some(else_final) => self.check_block(else_final, ctx),
                    None => Ok(()),
                }
            }
            Statement::While(stat) => {
                self.check_expr(&stat.cond, ctx)?;
                self.check_block(&stat.body, ctx)
            }
            Statement::For(stat) => {
                let mark = self.elements.mark();
                let result = self.check_for(stat, ctx);
                self.elements.restore(mark);

                result
            }
            Statement::ForRange(stat) => {
                self.check_expr(&stat.sequence, ctx)?;

                let element = self.next_element;
                self.next_element += 1;

                let mark = self.elements.mark();
                self.elements.bind(stat.binding, element);
                let result = self.check_block(
                    &stat.body,
                    Context {
                        in_for: true,
                        host_element: Some(element),
                        ..ctx
                    },
                );
                self.elements.restore(mark);

                result
            }
            Statement::ContinueWhile(stat) => {
                self.check_expr(&stat.cond, ctx)?;
                self.check_block(&stat.body, ctx)?;

                let handler_ctx = Context {
                    forbidden: ctx.host_element.or(ctx.forbidden),
                    ..ctx
                };
                for handler in [&stat.else_body, &stat.catch_body].into_iter().flatten() {
                    self.check_block(handler, handler_ctx)?;
                }
                Ok(())
            }
        }
    }

    fn check_for(&mut self, stat: &ForLoop, ctx: Context) -> Result<(), OutOfScopeLoopVariable> {
        if let Some(init) = stat.init {
            self.check_statement(init, ctx)?;
        }
        for header in [&stat.condition, &stat.iterate].into_iter().flatten() {
            self.check_expr(header, ctx)?;
        }

        self.check_block(
            &stat.body,
            Context {
                in_for: true,
                host_element: None,
                ..ctx
            },
        )
    }

    fn check_expr(&self, expr: &Expression, ctx: Context) -> Result<(), OutOfScopeLoopVariable> {
        match expr {
            Expression::Variable(name) => match self.elements.lookup(*name) {
                Some(element) if ctx.forbidden == Some(element) => {
                    Err(OutOfScopeLoopVariable::ElementBinding(*name))
                }
                _ => Ok(()),
            },
            Expression::ForIndex(_) if !ctx.in_for => Err(OutOfScopeLoopVariable::LoopIndex),
            Expression::ForIndex(_)
            | Expression::Bool(_)
            | Expression::Integer(_)
            | Expression::String(_) => Ok(()),
            Expression::Parenthesized(inner) => self.check_expr(inner, ctx),
            Expression::List(items) | Expression::Sequence(items) => {
                items.iter().try_for_each(|item| self.check_expr(item, ctx))
            }
            Expression::Index(index) => {
                self.check_expr(&index.target, ctx)?;
                self.check_expr(&index.index, ctx)
            }
            Expression::Call(call) => call.args.iter().try_for_each(|arg| self.check_expr(arg, ctx)),
            Expression::UnaryOp(op) => self.check_expr(op.operand(), ctx),
            Expression::BinaryOp(op) => {
                self.check_expr(op.lhs, ctx)?;
                self.check_expr(op.rhs, ctx)
            }
            Expression::Assign(assign) => {
                if self.elements.lookup(assign.target).is_some() {
                    return Err(OutOfScopeLoopVariable::AssignedElementBinding(assign.target));
                }
                self.check_expr(&assign.value, ctx)
            }
        }
    }
}
