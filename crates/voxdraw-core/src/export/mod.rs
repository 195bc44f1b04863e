//! Export functionality for voxel meshes

mod obj;

use crate::Result;
use crate::mesh::MeshBuffer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub use obj::export_obj;

impl MeshBuffer {
    /// Write the mesh to an OBJ file with per-vertex colors
    pub fn write_obj<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.extension().and_then(|e| e.to_str()) != Some("obj") {
            return Err(crate::Error::Export(format!(
                "Unsupported file extension: {}",
                path.display()
            )));
        }

        let file = File::create(path)?;
        export_obj(self, BufWriter::new(file))
    }
}
