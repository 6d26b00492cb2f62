use std::collections::HashMap;

use cwhile_parser::{
    block::Block,
    expressions::{
        operator::{
            AssignOp,
            BinaryKind,
            UnaryOperator,
        },
        Call,
        Expression,
        Index,
    },
    identifiers::Ident,
    statement::{
        for_loop::ForLoop,
        Statement,
    },
};

use crate::vm::{
    binop,
    ExecutionError,
    Value,
};

/// How control leaves a statement.
#[derive(Debug, PartialEq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Vec<Value>),
}

pub struct Context<'rt> {
    globals: &'rt mut HashMap<Ident, Value>,
    /// Block scopes, innermost last.
    scopes: Vec<HashMap<Ident, Value>>,

    steps: usize,
    step_limit: Option<usize>,
}

impl<'rt> Context<'rt> {
    pub fn new(globals: &'rt mut HashMap<Ident, Value>, step_limit: Option<usize>) -> Self {
        Self {
            globals,
            scopes: Default::default(),
            steps: 0,
            step_limit,
        }
    }
}

impl Context<'_> {
    pub fn execute(mut self, block: &Block) -> Result<Vec<Value>, ExecutionError> {
        match self.execute_block(block)? {
            Flow::Normal => Ok(vec![]),
            Flow::Return(values) => Ok(values),
            Flow::Break => Err(ExecutionError::StrayJump("break")),
            Flow::Continue => Err(ExecutionError::StrayJump("continue")),
        }
    }

    fn step(&mut self) -> Result<(), ExecutionError> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(ExecutionError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    fn execute_block(&mut self, block: &Block) -> Result<Flow, ExecutionError> {
        self.scopes.push(HashMap::default());
        let flow = self.execute_statements(block.statements);
        self.scopes.pop();
        flow
    }

    fn execute_statements(&mut self, statements: &[Statement]) -> Result<Flow, ExecutionError> {
        for statement in statements {
            match self.execute_statement(statement)? {
                Flow::Normal => (),
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Flow, ExecutionError> {
        self.step()?;

        #[cfg(feature = "trace_execution")]
        tracing::trace!(?statement, "executing");

        match statement {
            Statement::Empty(_) => Ok(Flow::Normal),
            Statement::Let(decl) => {
                let value = self.evaluate(&decl.value)?;
                self.declare(decl.name, value);
                Ok(Flow::Normal)
            }
            Statement::Expression(expr) => self.evaluate(expr).map(|_| Flow::Normal),
            Statement::Block(block) => self.execute_block(block),
            Statement::If(stat) => {
                if self.evaluate(&stat.cond)?.as_condition("if")? {
                    self.execute_block(&stat.body)
                } else if let Some(else_final) = &stat.else_final {
                    self.execute_block(else_final)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While(stat) => {
                loop {
                    self.step()?;
                    if !self.evaluate(&stat.cond)?.as_condition("while")? {
                        break;
                    }

                    match self.execute_block(&stat.body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => (),
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::For(stat) => {
                // The header gets a scope of its own so `let` in `init` ends
                // with the loop.
                self.scopes.push(HashMap::default());
                let flow = self.execute_for(stat);
                self.scopes.pop();
                flow
            }
            Statement::ForRange(_) => Err(ExecutionError::ExtensionNode("for (x : xs)")),
            Statement::ContinueWhile(_) => Err(ExecutionError::ExtensionNode("continue while")),
            Statement::Break(_) => Ok(Flow::Break),
            Statement::Continue(_) => Ok(Flow::Continue),
            Statement::Return(ret) => {
                let values = ret
                    .values
                    .iter()
                    .map(|value| self.evaluate(value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Flow::Return(values))
            }
        }
    }

    fn execute_for(&mut self, stat: &ForLoop) -> Result<Flow, ExecutionError> {
        if let Some(init) = stat.init {
            self.execute_statement(init)?;
        }

        loop {
            self.step()?;
            if let Some(cond) = &stat.condition {
                if !self.evaluate(cond)?.as_condition("for")? {
                    break;
                }
            }

            match self.execute_block(&stat.body)? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => (),
                ret @ Flow::Return(_) => return Ok(ret),
            }

            if let Some(iterate) = &stat.iterate {
                self.evaluate(iterate)?;
            }
        }

        Ok(Flow::Normal)
    }

    fn declare(&mut self, name: Ident, value: Value) {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name, value),
            None => self.globals.insert(name, value),
        };
    }

    fn lookup(&self, name: Ident) -> Result<&Value, ExecutionError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name))
            .or_else(|| self.globals.get(&name))
            .ok_or(ExecutionError::UnknownVariable(name))
    }

    /// Writes the innermost variable called `name`, creating a global if no
    /// local exists.
    fn store(&mut self, name: Ident, value: Value) {
        let slot = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(&name));

        match slot {
            Some(slot) => *slot = value,
            None => {
                self.globals.insert(name, value);
            }
        }
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Value, ExecutionError> {
        match expr {
            Expression::Parenthesized(inner) => self.evaluate(inner),
            Expression::Variable(name) => self.lookup(*name).cloned(),
            Expression::ForIndex(_) => Err(ExecutionError::ExtensionNode("for.index")),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::Integer(i) => Ok(Value::Int(*i)),
            Expression::String(s) => Ok(Value::from(s.as_str())),
            Expression::List(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expression::Index(index) => self.evaluate_index(index),
            Expression::Call(call) => self.evaluate_call(call),
            Expression::UnaryOp(op) => {
                let operand = self.evaluate(op.operand())?;
                match (op, operand) {
                    (UnaryOperator::Not(_), Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOperator::Minus(_), Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
                    (UnaryOperator::Not(_), other) => Err(ExecutionError::TypeMismatch {
                        op: "!",
                        type_name: other.type_name(),
                    }),
                    (UnaryOperator::Minus(_), other) => Err(ExecutionError::TypeMismatch {
                        op: "-",
                        type_name: other.type_name(),
                    }),
                }
            }
            Expression::BinaryOp(op) => {
                let lhs = self.evaluate(op.lhs)?;
                match (op.kind, &lhs) {
                    (BinaryKind::And, Value::Bool(false)) => return Ok(lhs),
                    (BinaryKind::Or, Value::Bool(true)) => return Ok(lhs),
                    _ => (),
                }
                let rhs = self.evaluate(op.rhs)?;
                binop::apply(op.kind, lhs, rhs)
            }
            Expression::Assign(assign) => {
                let value = self.evaluate(&assign.value)?;
                let value = match assign.op {
                    AssignOp::Set => value,
                    AssignOp::Add => {
                        binop::apply(BinaryKind::Plus, self.lookup(assign.target)?.clone(), value)?
                    }
                    AssignOp::Subtract => binop::apply(
                        BinaryKind::Minus,
                        self.lookup(assign.target)?.clone(),
                        value,
                    )?,
                };
                self.store(assign.target, value.clone());
                Ok(value)
            }
            Expression::Sequence(exprs) => {
                let mut last = Value::Nil;
                for expr in exprs.iter() {
                    last = self.evaluate(expr)?;
                }
                Ok(last)
            }
        }
    }

    fn evaluate_index(&mut self, index: &Index) -> Result<Value, ExecutionError> {
        let target = self.evaluate(&index.target)?;
        let position = self.evaluate(&index.index)?;

        let out_of_range = |index: i64, len: usize| ExecutionError::IndexOutOfRange { index, len };

        match (target, position) {
            (Value::List(items), Value::Int(i)) => usize::try_from(i)
                .ok()
                .and_then(|pos| items.get(pos))
                .cloned()
                .ok_or_else(|| out_of_range(i, items.len())),
            (Value::String(s), Value::Int(i)) => usize::try_from(i)
                .ok()
                .and_then(|pos| s.chars().nth(pos))
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| out_of_range(i, s.chars().count())),
            (target, position) => Err(ExecutionError::BinaryTypeMismatch {
                op: "[]",
                lhs: target.type_name(),
                rhs: position.type_name(),
            }),
        }
    }

    fn evaluate_call(&mut self, call: &Call) -> Result<Value, ExecutionError> {
        let args = call
            .args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match &*call.function {
            "len" => match args.as_slice() {
                [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
                [Value::String(s)] => Ok(Value::Int(s.chars().count() as i64)),
                [other] => Err(ExecutionError::TypeMismatch {
                    op: "len",
                    type_name: other.type_name(),
                }),
                _ => Err(ExecutionError::ArgumentCount {
                    function: call.function,
                    expected: 1,
                    found: args.len(),
                }),
            },
            _ => Err(ExecutionError::UnknownFunction(call.function)),
        }
    }
}
