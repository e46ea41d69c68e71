use bytemuck::{Pod, Zeroable};

use crate::error::Error;

/// One vertex as the vertex shader pulls it out of the vertex storage buffer:
/// eight tightly packed floats.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// A mesh whose data has been placed into the shared scene layout.
///
/// `indices` are already global, i.e. they address the concatenated vertex
/// array of the whole [`Model`], not just `vertices`.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub vertex_offset: u32,
    pub index_offset: u32,
    pub material_id: u32,
}

impl Mesh {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Host-side scene geometry, laid out so that every mesh's vertices and
/// indices start where the previous mesh's ended.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    /// Appends a mesh. `local_indices` address `vertices` and are rebased
    /// onto the running vertex count before being stored.
    pub fn push_mesh(
        &mut self,
        name: &str,
        vertices: Vec<Vertex>,
        local_indices: &[u32],
        material_id: u32,
    ) -> Result<(), Error> {
        let invalid = |reason: String| Error::InvalidGeometry {
            mesh: name.to_string(),
            reason,
        };
        if local_indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "{} indices is not a whole number of triangles",
                local_indices.len()
            )));
        }
        if let Some(&index) = local_indices
            .iter()
            .find(|&&index| index as usize >= vertices.len())
        {
            return Err(invalid(format!(
                "index {index} is out of range for {} vertices",
                vertices.len()
            )));
        }
        let new_vertex_count = u32::try_from(self.vertex_count as usize + vertices.len())
            .map_err(|_| invalid("vertex count overflows u32".to_string()))?;
        let new_index_count = u32::try_from(self.index_count as usize + local_indices.len())
            .map_err(|_| invalid("index count overflows u32".to_string()))?;

        let base_vertex = self.vertex_count;
        let indices = local_indices
            .iter()
            .map(|&index| index + base_vertex)
            .collect::<Vec<_>>();
        self.meshes.push(Mesh {
            vertices,
            indices,
            vertex_offset: self.vertex_count,
            index_offset: self.index_count,
            material_id,
        });
        self.vertex_count = new_vertex_count;
        self.index_count = new_index_count;
        Ok(())
    }
}
