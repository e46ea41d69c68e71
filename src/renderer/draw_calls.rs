use bytemuck::{Pod, Zeroable};

use crate::renderer::model::Model;

/// Per-draw metadata, looked up in the vertex shader with `gl_BaseInstance`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawData {
    pub index_offset: u32,
    pub vertex_offset: u32,
    pub material_id: u32,
    /// Reserved for per-draw transforms, always 0 for now.
    pub transform_id: u32,
}

/// Layout of one `glMultiDrawArraysIndirect` record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawArraysIndirectCommand {
    pub count: u32,
    pub instance_count: u32,
    pub first: u32,
    pub base_instance: u32,
}

/// Stores everything needed to render a whole [`Model`] with a single
/// multi-draw call: one [`DrawData`] row and one indirect command per mesh,
/// with command `i` pointing at row `i` through its `base_instance`.
#[derive(Debug, Default)]
pub struct DrawCalls {
    draw_data: Vec<DrawData>,
    commands: Vec<DrawArraysIndirectCommand>,
}

impl DrawCalls {
    pub fn new() -> DrawCalls {
        DrawCalls::default()
    }

    pub fn from_model(model: &Model) -> DrawCalls {
        let mut draw_calls = DrawCalls::new();
        for mesh in &model.meshes {
            draw_calls.add(
                DrawData {
                    index_offset: mesh.index_offset,
                    vertex_offset: mesh.vertex_offset,
                    material_id: mesh.material_id,
                    transform_id: 0,
                },
                mesh.index_count(),
            );
        }
        draw_calls
    }

    /// Adds a draw of `index_count` indices described by `draw_data`.
    ///
    /// `first` stays 0: the vertex shader pulls its index from
    /// `draw_data.index_offset + gl_VertexID`.
    pub fn add(&mut self, draw_data: DrawData, index_count: u32) {
        let base_instance = self.draw_data.len() as u32;
        self.draw_data.push(draw_data);
        self.commands.push(DrawArraysIndirectCommand {
            count: index_count,
            instance_count: 1,
            first: 0,
            base_instance,
        });
    }

    pub fn draw_data(&self) -> &[DrawData] {
        &self.draw_data
    }

    pub fn commands(&self) -> &[DrawArraysIndirectCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
