//! Rhai-backed interpreter for draw scripts

use crate::math_api::register_math_api;
use rhai::{AST, CallFnOptions, Dynamic, Engine, INT, Scope};
use voxdraw_core::{CompileError, DrawValue, EvalError, Interpreter};

/// Name of the per-cell entry point
pub const DRAW_FN: &str = "draw";

/// Number of parameters `draw` must declare: `x, y, z, gridSize`
pub const DRAW_ARITY: usize = 4;

/// Resource limits applied to every `draw` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    /// Operations allowed per cell, 0 for unlimited
    pub max_operations: u64,
    /// Maximum script function call depth
    pub max_call_depth: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_call_depth: 64,
        }
    }
}

/// A compiled draw script
#[derive(Debug, Clone)]
pub struct DrawProgram {
    ast: AST,
}

impl DrawProgram {
    /// Access the compiled AST
    pub fn ast(&self) -> &AST {
        &self.ast
    }
}

/// voxdraw script engine for evaluating draw scripts
pub struct ScriptEngine {
    engine: Engine,
}

impl ScriptEngine {
    /// Create a new script engine with the math namespace and default limits
    pub fn new() -> Self {
        Self::with_limits(ScriptLimits::default())
    }

    /// Create a script engine with custom per-cell limits
    pub fn with_limits(limits: ScriptLimits) -> Self {
        let mut engine = Engine::new();

        register_math_api(&mut engine);

        // Route script output into the log
        engine.on_print(|text| tracing::info!(target: "voxdraw::script", "{text}"));
        engine.on_debug(|text, _source, pos| {
            tracing::debug!(target: "voxdraw::script", line = ?pos.line(), "{text}");
        });
        engine.register_fn("log", |text: &str| {
            tracing::info!(target: "voxdraw::script", "{text}");
        });

        // Configure engine for better errors and bounded per-cell work
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_depth);

        Self { engine }
    }

    /// Get a reference to the underlying Rhai engine
    pub fn inner(&self) -> &Engine {
        &self.engine
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter for ScriptEngine {
    type Program = DrawProgram;

    fn compile(&self, source: &str) -> Result<DrawProgram, CompileError> {
        let ast = self.engine.compile(source).map_err(|err| {
            CompileError::new(err.err_type().to_string(), err.position().line())
        })?;

        let arities: Vec<usize> = ast
            .iter_functions()
            .filter(|f| f.name == DRAW_FN)
            .map(|f| f.params.len())
            .collect();

        if arities.is_empty() {
            return Err(CompileError::new(
                "Script must define fn draw(x, y, z, gridSize)",
                None,
            ));
        }
        if !arities.contains(&DRAW_ARITY) {
            return Err(CompileError::new(
                format!(
                    "draw must take {DRAW_ARITY} parameters (x, y, z, gridSize), found {}",
                    arities[0]
                ),
                None,
            ));
        }

        Ok(DrawProgram { ast })
    }

    fn draw(
        &self,
        program: &DrawProgram,
        x: usize,
        y: usize,
        z: usize,
        grid_size: usize,
    ) -> Result<DrawValue, EvalError> {
        // Top-level statements are not re-run per cell
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let mut scope = Scope::new();
        let args = (x as INT, y as INT, z as INT, grid_size as INT);

        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut scope, &program.ast, DRAW_FN, args)
            .map(to_draw_value)
            .map_err(|err| EvalError::new(err.to_string(), err.position().line()))
    }
}

/// Convert a Rhai return value into the language-neutral form
fn to_draw_value(value: Dynamic) -> DrawValue {
    if value.is_string() {
        value
            .into_string()
            .map_or(DrawValue::Other, DrawValue::Text)
    } else if let Ok(flag) = value.as_bool() {
        DrawValue::Bool(flag)
    } else {
        DrawValue::Other
    }
}
