//! Drawing session
//!
//! A [`Session`] owns everything a run touches: settings, the grid, the
//! scene synchronizer, the scene backend and the runner. Runs, resizes and
//! reads all go through it.

use crate::config::{Settings, SettingsError};
use crate::runner::{Checkpoint, NoYield, RunError, RunPhase, RunReport, ScriptRunner};
use crate::scene::{MemoryScene, SceneBackend, SceneSync};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use voxdraw_core::{CompileError, CssColorParser, Interpreter, SurfaceMesher, VoxelGrid};
use voxdraw_script::ScriptEngine;

/// The mutable state a run operates on
pub struct World<S: SceneBackend> {
    pub grid: VoxelGrid,
    pub sync: SceneSync<S>,
    pub scene: S,
}

impl<S: SceneBackend> World<S> {
    pub fn new(grid_size: usize, mesher: SurfaceMesher, scene: S) -> Self {
        Self {
            grid: VoxelGrid::new(grid_size),
            sync: SceneSync::new(mesher),
            scene,
        }
    }

    fn teardown(&mut self) {
        let World { sync, scene, .. } = self;
        sync.clear(scene);
    }
}

/// A drawing session over one grid and one scene
pub struct Session<I: Interpreter, S: SceneBackend> {
    settings: Mutex<Settings>,
    runner: ScriptRunner<I>,
    world: Mutex<World<S>>,
}

impl Session<ScriptEngine, MemoryScene> {
    /// A Rhai session rendering into an in-memory scene
    pub fn headless(settings: Settings) -> Result<Self, SettingsError> {
        let engine = ScriptEngine::with_limits(settings.script_limits());
        Self::new(engine, MemoryScene::new(), settings)
    }
}

impl<I: Interpreter, S: SceneBackend> Session<I, S> {
    pub fn new(interpreter: I, scene: S, settings: Settings) -> Result<Self, SettingsError> {
        Self::with_mesher(
            interpreter,
            scene,
            settings,
            SurfaceMesher::new(CssColorParser),
        )
    }

    /// Create a session with a custom mesher (and so a custom color parser)
    pub fn with_mesher(
        interpreter: I,
        scene: S,
        settings: Settings,
        mesher: SurfaceMesher,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;

        let runner = ScriptRunner::new(interpreter).with_yield_every(settings.yield_every_rows);
        let world = World::new(settings.grid_size, mesher, scene);

        tracing::debug!(grid_size = settings.grid_size, "session created");

        Ok(Self {
            settings: Mutex::new(settings),
            runner,
            world: Mutex::new(world),
        })
    }

    /// Run `source` without yielding
    pub fn run(&self, source: &str) -> Result<RunReport, RunError> {
        self.run_with(source, &mut NoYield)
    }

    /// Run `source`, calling `checkpoint` between rows
    ///
    /// Returns [`RunError::Busy`] without side effects when a run is already
    /// in progress, including a nested call from inside `checkpoint`.
    pub fn run_with(
        &self,
        source: &str,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<RunReport, RunError> {
        if self.runner.is_running() {
            return Err(RunError::Busy);
        }
        let mut world = self.world.try_lock().ok_or(RunError::Busy)?;
        self.runner.run(source, &mut world, checkpoint)
    }

    /// Syntax check only; the grid and scene are untouched
    pub fn compile(&self, source: &str) -> Result<(), CompileError> {
        self.runner.interpreter().compile(source).map(|_| ())
    }

    /// Change the grid edge length, clearing every cell
    pub fn resize(&self, size: usize) -> Result<(), RunError> {
        if self.runner.is_running() {
            return Err(RunError::Busy);
        }
        let max = self.settings.lock().max_grid_size;
        if size == 0 || size > max {
            return Err(RunError::InvalidGridSize { size, max });
        }

        let mut world = self.world.try_lock().ok_or(RunError::Busy)?;
        world.grid.resize(size);
        self.settings.lock().grid_size = size;
        tracing::debug!(size, "grid resized");
        Ok(())
    }

    /// Current grid edge length; safe to call from a checkpoint
    pub fn grid_size(&self) -> usize {
        self.settings.lock().grid_size
    }

    /// Read access to the grid
    ///
    /// Returns [`RunError::Busy`] while a run is in progress, including from
    /// inside a checkpoint. Runs are rejected as busy while the returned guard
    /// is alive.
    pub fn grid(&self) -> Result<MappedMutexGuard<'_, VoxelGrid>, RunError> {
        self.world
            .try_lock()
            .map(|world| MutexGuard::map(world, |world| &mut world.grid))
            .ok_or(RunError::Busy)
    }

    /// Read access to the scene backend
    ///
    /// Same locking rules as [`Session::grid`].
    pub fn scene(&self) -> Result<MappedMutexGuard<'_, S>, RunError> {
        self.world
            .try_lock()
            .map(|world| MutexGuard::map(world, |world| &mut world.scene))
            .ok_or(RunError::Busy)
    }

    pub fn phase(&self) -> RunPhase {
        self.runner.phase()
    }

    /// Snapshot of the settings, reflecting any resize
    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    /// Release the installed mesh and end the session
    pub fn shutdown(self) {
        drop(self);
    }
}

impl<I: Interpreter, S: SceneBackend> Drop for Session<I, S> {
    fn drop(&mut self) {
        self.world.get_mut().teardown();
        tracing::debug!("session shut down");
    }
}
