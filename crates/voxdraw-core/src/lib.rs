//! # voxdraw Core
//!
//! Voxel sculptures from a single script function.
//!
//! A user script defines `draw(x, y, z, gridSize)`; evaluating it over every
//! cell of an N×N×N [`VoxelGrid`] fills the grid with color tokens, and the
//! [`SurfaceMesher`] turns the filled grid into a renderable surface with
//! interior faces culled.
//!
//! ## Quick Start
//!
//! ```rust
//! use voxdraw_core::prelude::*;
//!
//! let mut grid = VoxelGrid::new(3);
//! grid.set(1, 1, 1, Color::token("blue"));
//!
//! let mesh = SurfaceMesher::default().build(&grid);
//! assert_eq!(mesh.face_count(), 6);
//! ```
//!
//! ## Conventions
//!
//! - **Coordinates**: integer cell indices `0..size` on each axis
//! - **Positions**: centered on the origin, one unit per cell
//! - **Coordinate system**: Right-handed, Y-up
//! - **Colors**: `f32` RGB in `0.0..=1.0`

pub mod color;
pub mod export;
pub mod grid;
pub mod interp;
pub mod mesh;

mod error;

pub use color::{Color, ColorError, ColorParser, CssColorParser, Rgb};
pub use error::{Error, Result};
pub use grid::VoxelGrid;
pub use interp::{CompileError, DrawValue, EvalError, Interpreter};
pub use mesh::{MeshBuffer, SurfaceMesher, VoxelVertex};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::color::{Color, ColorParser, CssColorParser, Rgb};
    pub use crate::export::export_obj;
    pub use crate::grid::VoxelGrid;
    pub use crate::interp::{CompileError, DrawValue, EvalError, Interpreter};
    pub use crate::mesh::{Direction, MeshBuffer, SurfaceMesher, VoxelVertex};

    // Math (re-export glam)
    pub use glam::{IVec3, Vec3};

    // Error handling
    pub use crate::{Error, Result};
}
