//! OBJ file export
//!
//! Vertex colors use the widely supported `v x y z r g b` extension.

use crate::Result;
use crate::mesh::MeshBuffer;
use std::io::Write;

/// Export a mesh buffer in OBJ format
pub fn export_obj<W: Write>(mesh: &MeshBuffer, mut writer: W) -> Result<()> {
    // Header
    writeln!(writer, "# voxdraw OBJ export")?;
    writeln!(writer, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(writer, "# Faces: {}", mesh.face_count())?;
    writeln!(writer)?;

    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i);
        let c = mesh.color(i);
        writeln!(writer, "v {} {} {} {} {} {}", p.x, p.y, p.z, c.r, c.g, c.b)?;
    }
    writeln!(writer)?;

    for i in 0..mesh.vertex_count() {
        let n = mesh.normal(i);
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    writeln!(writer)?;

    // OBJ uses 1-based indexing
    for tri in mesh.indices.chunks(3) {
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }

    writer.flush()?;
    Ok(())
}
