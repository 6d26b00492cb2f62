use cwhile_desugar::{
    desugar_block,
    DesugarError,
};
use cwhile_parser::{
    block::Block,
    parse_chunk,
    ASTAllocator,
    ChunkParseError,
};
use thiserror::Error;
use tracing::instrument;

pub mod vm;

pub use self::vm::{
    runtime::Runtime,
    ExecutionError,
    Value,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CwhileError {
    #[error("syntax error: {0}")]
    SyntaxError(String),
    #[error(transparent)]
    Desugar(#[from] DesugarError),
    #[error("execution error: {0}")]
    ExecutionError(#[from] ExecutionError),
}

impl From<ChunkParseError> for CwhileError {
    fn from(err: ChunkParseError) -> Self {
        Self::SyntaxError(err.to_string())
    }
}

/// Parses `src` and rewrites every loop extension in it, leaving a block made
/// only of primitive statements.
#[instrument(level = "trace", name = "desugar_source", skip(src, alloc), fields(src_bytes = src.len()))]
pub fn desugar_source<'chunk>(
    src: &str,
    alloc: &'chunk ASTAllocator,
) -> Result<Block<'chunk>, CwhileError> {
    let ast = parse_chunk(src, alloc)?;

    Ok(desugar_block(&ast, alloc)?)
}

/// Desugars `src` and executes it in a fresh runtime.
pub fn run(src: &str) -> Result<Vec<Value>, CwhileError> {
    let alloc = ASTAllocator::default();
    let block = desugar_source(src, &alloc)?;

    Ok(Runtime::default().execute(&block)?)
}
