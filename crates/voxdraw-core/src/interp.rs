//! Script interpreter capability
//!
//! The runner never talks to a scripting language directly. It compiles a
//! source text once through an [`Interpreter`] and then asks it to evaluate
//! `draw(x, y, z, gridSize)` per cell, getting back a language-neutral
//! [`DrawValue`]. Tests substitute a plain Rust closure for the real engine.

use std::fmt;

/// Language-neutral view of what `draw` returned for one cell
#[derive(Debug, Clone, PartialEq)]
pub enum DrawValue {
    /// A string; used verbatim as the cell's color token
    Text(String),
    /// A boolean; `true` fills the cell with the default color
    Bool(bool),
    /// Anything else (numbers, unit, arrays, ...); leaves the cell empty
    Other,
}

/// Source text could not be turned into a runnable program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    /// 1-based source line, when the interpreter reports one
    pub line: Option<usize>,
}

impl CompileError {
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {})", self.message, line),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// Evaluating `draw` for a single cell failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub message: String,
    pub line: Option<usize>,
}

impl EvalError {
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {})", self.message, line),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for EvalError {}

/// A scripting language able to evaluate a `draw` entry point
pub trait Interpreter {
    /// Compiled, reusable form of a script
    type Program;

    /// Parse `source` once. A failure here is fatal for the run.
    fn compile(&self, source: &str) -> Result<Self::Program, CompileError>;

    /// Evaluate `draw(x, y, z, grid_size)` for one cell
    fn draw(
        &self,
        program: &Self::Program,
        x: usize,
        y: usize,
        z: usize,
        grid_size: usize,
    ) -> Result<DrawValue, EvalError>;
}
