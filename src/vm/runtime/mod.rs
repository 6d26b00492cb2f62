use std::collections::HashMap;

use cwhile_parser::{
    block::Block,
    identifiers::Ident,
};
use tracing::instrument;

use crate::vm::ExecutionError;

pub mod execution_context;
pub mod value;

pub use self::value::Value;

/// Executes desugared blocks. Any extension node still present is reported
/// as [`ExecutionError::ExtensionNode`] when it is reached.
#[derive(Debug, Default)]
pub struct Runtime {
    globals: HashMap<Ident, Value>,
    step_limit: Option<usize>,
}

impl Runtime {
    /// Fails execution with [`ExecutionError::StepLimitExceeded`] once more
    /// than `limit` statements and loop tests have run.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Registers a value associated with a global variable which will be
    /// available to code executed with this runtime.
    pub fn register_global(&mut self, name: &str, value: impl Into<Value>) {
        self.globals.insert(Ident::new(name), value.into());
    }

    /// Reads the value associated with a global variable. Assignments to
    /// undeclared variables create globals.
    pub fn load_global(&self, name: &str) -> Option<&Value> {
        self.globals.get(&Ident::new(name))
    }

    /// Execute the provided block until it completes, returns or fails.
    #[instrument(level = "trace", name = "execute", skip_all, fields(statements = block.statements.len()))]
    pub fn execute(&mut self, block: &Block) -> Result<Vec<Value>, ExecutionError> {
        execution_context::Context::new(&mut self.globals, self.step_limit).execute(block)
    }
}
