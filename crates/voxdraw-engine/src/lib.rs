//! voxdraw engine - session runtime for scripted voxel sculptures
//!
//! Ties a script interpreter, the voxel grid, the surface mesher and a scene
//! backend together. A [`Session`] is the entry point:
//!
//! ```no_run
//! use voxdraw_engine::{Session, Settings};
//!
//! let session = Session::headless(Settings::default())?;
//! let report = session.run(r#"
//!     fn draw(x, y, z, n) {
//!         if y == 0 { "tan" } else { false }
//!     }
//! "#)?;
//! println!("{} faces, {} warnings", report.faces, report.warnings.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod runner;
pub mod scene;
pub mod session;

pub use config::{GRID_SIZE_LIMIT, Settings, SettingsError};
pub use runner::{
    CellWarning, Checkpoint, NoYield, RowProgress, RunError, RunPhase, RunReport, ScriptRunner,
    ThreadYield,
};
pub use scene::{Material, MemoryScene, MeshId, RenderMesh, SceneBackend, SceneEvent, SceneSync};
pub use session::{Session, World};

pub use voxdraw_core::{MeshBuffer, VoxelGrid};
pub use voxdraw_script::ScriptEngine;

#[cfg(feature = "file-watcher")]
pub use voxdraw_script::{ScriptChange, ScriptWatcher, WatchError};
