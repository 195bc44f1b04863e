//! Surface mesh generation from a voxel grid
//!
//! Every occupied cell contributes one quad for each of its six faces whose
//! neighbor is empty (cells outside the grid count as empty). Quads never
//! share vertices, so each face carries its own flat normal and color.

mod faces;

use crate::color::{Color, ColorParser, CssColorParser, Rgb};
use crate::grid::VoxelGrid;
use glam::Vec3;
use std::collections::HashMap;

pub use faces::{Direction, QUAD_INDICES};

/// Interleaved vertex for GPU upload
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VoxelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Flat vertex/index buffers describing a voxel surface
///
/// `positions`, `normals` and `colors` each hold three floats per vertex and
/// always have the same length. Every exposed face adds four vertices and six
/// indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get number of quad faces
    pub fn face_count(&self) -> usize {
        self.indices.len() / QUAD_INDICES.len()
    }

    /// True when no face was emitted
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    /// Normal of vertex `i`
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[i * 3..i * 3 + 3])
    }

    /// Color of vertex `i`
    pub fn color(&self, i: usize) -> Rgb {
        let c = &self.colors[i * 3..i * 3 + 3];
        Rgb::new(c[0], c[1], c[2])
    }

    /// Interleave the attribute buffers into one vertex array
    pub fn interleaved(&self) -> Vec<VoxelVertex> {
        (0..self.vertex_count())
            .map(|i| VoxelVertex {
                position: self.position(i).to_array(),
                normal: self.normal(i).to_array(),
                color: self.color(i).to_array(),
            })
            .collect()
    }

    /// Append one quad. `origin` is the cell's minimum corner in mesh space.
    fn push_face(&mut self, origin: Vec3, direction: Direction, color: Rgb) {
        let base = self.vertex_count() as u32;
        let normal = direction.normal().to_array();
        let color = color.to_array();

        for corner in direction.corners() {
            let position = origin + Vec3::from_array(corner);
            self.positions.extend_from_slice(&position.to_array());
            self.normals.extend_from_slice(&normal);
            self.colors.extend_from_slice(&color);
        }

        self.indices.extend(QUAD_INDICES.iter().map(|&i| base + i));
    }
}

/// Builds a [`MeshBuffer`] from a [`VoxelGrid`]
pub struct SurfaceMesher {
    colors: Box<dyn ColorParser>,
}

impl Default for SurfaceMesher {
    fn default() -> Self {
        Self::new(CssColorParser)
    }
}

impl SurfaceMesher {
    /// Create a mesher that resolves cell colors with `parser`
    pub fn new(parser: impl ColorParser + 'static) -> Self {
        Self {
            colors: Box::new(parser),
        }
    }

    /// Walk the whole grid and emit every exposed face
    ///
    /// Cells are visited in the grid's fixed `y`, `z`, `x` order, so the output
    /// is deterministic for a given grid. Positions are shifted by
    /// `size / 2 - 0.5` so the sculpture is centered on the origin. A token
    /// the parser rejects is drawn in [`Rgb::DEFAULT`]; it never aborts the build.
    pub fn build(&self, grid: &VoxelGrid) -> MeshBuffer {
        let center_offset = Vec3::splat(grid.size() as f32 / 2.0 - 0.5);
        let mut resolved: HashMap<&Color, Rgb> = HashMap::new();
        let mut mesh = MeshBuffer::new();

        for ((x, y, z), color) in grid.iter_occupied() {
            let rgb = *resolved
                .entry(color)
                .or_insert_with(|| self.resolve_color(color));

            let origin = Vec3::new(x as f32, y as f32, z as f32) - center_offset;
            let (xi, yi, zi) = (x as i64, y as i64, z as i64);

            for direction in Direction::ALL {
                let [dx, dy, dz] = direction.offset();
                if grid.is_occupied(xi + dx, yi + dy, zi + dz) {
                    continue;
                }
                mesh.push_face(origin, direction, rgb);
            }
        }

        tracing::debug!(
            grid_size = grid.size(),
            faces = mesh.face_count(),
            vertices = mesh.vertex_count(),
            "built voxel surface"
        );

        mesh
    }

    fn resolve_color(&self, color: &Color) -> Rgb {
        self.colors.resolve(color).unwrap_or_else(|err| {
            tracing::warn!(token = ?color.as_token(), %err, "unparseable color, using default");
            Rgb::DEFAULT
        })
    }
}
