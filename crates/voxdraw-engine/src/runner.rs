//! Script runner
//!
//! Drives one evaluation: reset the grid, compile the script once, call
//! `draw` for every cell in `y, z, x` order, then hand the grid to
//! [`SceneSync`](crate::scene::SceneSync) exactly once.

use crate::scene::SceneBackend;
use crate::session::World;
use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use voxdraw_core::{Color, CompileError, DrawValue, Interpreter, VoxelGrid};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Compiling,
    Evaluating,
    MeshRebuilding,
}

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("A run is already in progress")]
    Busy,

    #[error("Script failed to compile: {0}")]
    Compile(#[from] CompileError),

    #[error("Invalid grid size {size}: must be between 1 and {max}")]
    InvalidGridSize { size: usize, max: usize },
}

impl RunError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::Busy => "busy",
            RunError::Compile(_) => "compile",
            RunError::InvalidGridSize { .. } => "invalid_grid_size",
        }
    }
}

/// Progress through the x-rows of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowProgress {
    pub rows_done: usize,
    pub rows_total: usize,
}

impl RowProgress {
    /// Completed fraction in 0-1
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        if self.rows_total == 0 {
            1.0
        } else {
            self.rows_done as f32 / self.rows_total as f32
        }
    }
}

/// Cooperative yield point called between rows
pub trait Checkpoint {
    fn row_done(&mut self, progress: RowProgress);
}

impl<F: FnMut(RowProgress)> Checkpoint for F {
    fn row_done(&mut self, progress: RowProgress) {
        self(progress);
    }
}

/// Never yields; for batch use
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl Checkpoint for NoYield {
    fn row_done(&mut self, _progress: RowProgress) {}
}

/// Yields the OS thread at every checkpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadYield;

impl Checkpoint for ThreadYield {
    fn row_done(&mut self, _progress: RowProgress) {
        std::thread::yield_now();
    }
}

/// A cell whose `draw` call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWarning {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub message: String,
}

impl fmt::Display for CellWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}): {}", self.x, self.y, self.z, self.message)
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub grid_size: usize,
    pub occupied_cells: usize,
    pub faces: usize,
    pub warnings: Vec<CellWarning>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Resets the phase to `Idle` when dropped, including on unwind
struct PhaseGuard<'a> {
    phase: &'a Mutex<RunPhase>,
}

impl PhaseGuard<'_> {
    fn advance(&self, next: RunPhase) {
        *self.phase.lock() = next;
        tracing::debug!(phase = ?next, "run phase");
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock() = RunPhase::Idle;
    }
}

/// Evaluates scripts over a voxel grid
pub struct ScriptRunner<I: Interpreter> {
    interpreter: I,
    phase: Mutex<RunPhase>,
    yield_every_rows: usize,
}

impl<I: Interpreter> ScriptRunner<I> {
    pub fn new(interpreter: I) -> Self {
        Self {
            interpreter,
            phase: Mutex::new(RunPhase::Idle),
            yield_every_rows: 1,
        }
    }

    /// Call the checkpoint every `rows` x-rows (0 is treated as 1)
    #[must_use]
    pub fn with_yield_every(mut self, rows: usize) -> Self {
        self.yield_every_rows = rows.max(1);
        self
    }

    pub fn phase(&self) -> RunPhase {
        *self.phase.lock()
    }

    pub fn is_running(&self) -> bool {
        self.phase() != RunPhase::Idle
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    fn begin(&self) -> Result<PhaseGuard<'_>, RunError> {
        let mut phase = self.phase.lock();
        if *phase != RunPhase::Idle {
            tracing::warn!(phase = ?*phase, "rejected re-entrant run");
            return Err(RunError::Busy);
        }
        *phase = RunPhase::Compiling;
        Ok(PhaseGuard { phase: &self.phase })
    }

    /// Run `source` against `world`
    ///
    /// A compile failure leaves the grid empty and the scene untouched.
    /// Per-cell failures are collected as warnings and the cell stays empty.
    pub fn run<S: SceneBackend>(
        &self,
        source: &str,
        world: &mut World<S>,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<RunReport, RunError> {
        let guard = self.begin()?;
        let started = Instant::now();

        world.grid.reset_all();

        let program = match self.interpreter.compile(source) {
            Ok(program) => program,
            Err(err) => {
                tracing::warn!(line = ?err.line, "compile failed: {}", err.message);
                return Err(RunError::Compile(err));
            }
        };

        guard.advance(RunPhase::Evaluating);
        let warnings = self.evaluate(&program, &mut world.grid, checkpoint);

        guard.advance(RunPhase::MeshRebuilding);
        let faces = world.sync.update(&mut world.scene, &world.grid);

        let report = RunReport {
            grid_size: world.grid.size(),
            occupied_cells: world.grid.occupied_count(),
            faces,
            warnings,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            grid_size = report.grid_size,
            occupied = report.occupied_cells,
            faces = report.faces,
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "run complete"
        );

        Ok(report)
    }

    fn evaluate(
        &self,
        program: &I::Program,
        grid: &mut VoxelGrid,
        checkpoint: &mut dyn Checkpoint,
    ) -> Vec<CellWarning> {
        let size = grid.size();
        let rows_total = size * size;
        let mut rows_done = 0;
        let mut warnings = Vec::new();

        for y in 0..size {
            for z in 0..size {
                for x in 0..size {
                    match self.interpreter.draw(program, x, y, z, size) {
                        Ok(value) => grid.set(x, y, z, cell_value(value)),
                        Err(err) => {
                            tracing::warn!(x, y, z, "draw failed: {err}");
                            grid.clear(x, y, z);
                            warnings.push(CellWarning {
                                x,
                                y,
                                z,
                                message: err.to_string(),
                            });
                        }
                    }
                }

                rows_done += 1;
                if rows_done % self.yield_every_rows == 0 || rows_done == rows_total {
                    checkpoint.row_done(RowProgress {
                        rows_done,
                        rows_total,
                    });
                }
            }
        }

        warnings
    }
}

/// Map a draw result onto a cell
fn cell_value(value: DrawValue) -> Option<Color> {
    match value {
        DrawValue::Text(token) => Some(Color::Token(token)),
        DrawValue::Bool(true) => Some(Color::Default),
        DrawValue::Bool(false) | DrawValue::Other => None,
    }
}
