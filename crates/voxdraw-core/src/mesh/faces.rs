//! Cube face tables
//!
//! Each face lists its four corners relative to the cell's minimum corner.
//! Corner order is chosen so the triangles `(0, 1, 2)` and `(2, 1, 3)` are
//! counter-clockwise when viewed from outside the cube.

use glam::Vec3;

/// One of the six axis-aligned face directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -X
    Left,
    /// +X
    Right,
    /// -Y
    Bottom,
    /// +Y
    Top,
    /// -Z
    Back,
    /// +Z
    Front,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Left,
        Direction::Right,
        Direction::Bottom,
        Direction::Top,
        Direction::Back,
        Direction::Front,
    ];

    /// Integer step to the neighboring cell in this direction
    pub const fn offset(self) -> [i64; 3] {
        match self {
            Direction::Left => [-1, 0, 0],
            Direction::Right => [1, 0, 0],
            Direction::Bottom => [0, -1, 0],
            Direction::Top => [0, 1, 0],
            Direction::Back => [0, 0, -1],
            Direction::Front => [0, 0, 1],
        }
    }

    /// Outward unit normal
    pub fn normal(self) -> Vec3 {
        let [x, y, z] = self.offset();
        Vec3::new(x as f32, y as f32, z as f32)
    }

    /// Corner offsets of the face, in triangle winding order
    pub const fn corners(self) -> [[f32; 3]; 4] {
        match self {
            Direction::Left => [
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 1.0],
                [0.0, 0.0, 1.0],
            ],
            Direction::Right => [
                [1.0, 1.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
            ],
            Direction::Bottom => [
                [1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
            ],
            Direction::Top => [
                [0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            Direction::Back => [
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            Direction::Front => [
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
            ],
        }
    }
}

/// Index pattern for one quad, relative to its first vertex
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_corner_winding_faces_outward() {
        for dir in Direction::ALL {
            let corners = dir.corners().map(Vec3::from_array);
            for tri in QUAD_INDICES.chunks(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| corners[i as usize]);
                let winding = (b - a).cross(c - a).normalize();
                let normal = dir.normal();
                assert_relative_eq!(winding.x, normal.x);
                assert_relative_eq!(winding.y, normal.y);
                assert_relative_eq!(winding.z, normal.z);
            }
        }
    }

    #[test]
    fn test_corners_lie_on_face_plane() {
        for dir in Direction::ALL {
            let normal = dir.normal();
            // The face plane sits at 0 for negative directions and 1 for positive ones
            let plane = normal.max_element().max(0.0);
            for corner in dir.corners().map(Vec3::from_array) {
                let along = corner.dot(normal.abs());
                assert_relative_eq!(along, plane);
            }
        }
    }
}
