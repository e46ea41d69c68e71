use std::mem::size_of;

use crate::error::Error;
use crate::renderer::draw_calls::DrawCalls;
use crate::renderer::gl;
use crate::renderer::material::{MaterialTable, TextureSlot};
use crate::renderer::model::{Model, Vertex};
use crate::renderer::texture::TextureUploader;

/// Buffer binding points shared with `res/shaders/mesh_*.glsl`.
pub mod binding {
    /// Uniform buffer: view and projection matrices.
    pub const PER_FRAME: u32 = 0;
    pub const VERTICES: u32 = 1;
    pub const INDICES: u32 = 2;
    pub const DRAW_DATA: u32 = 3;
    pub const MATERIALS: u32 = 4;
    pub const TEXTURE_HANDLES: u32 = 5;
}

/// The whole scene in GPU memory: concatenated geometry, per-draw metadata,
/// the indirect command list, materials and resident texture handles.
pub struct GpuScene {
    vertex_buffer: gl::types::GLuint,
    index_buffer: gl::types::GLuint,
    draw_data_buffer: gl::types::GLuint,
    draw_command_buffer: gl::types::GLuint,
    material_buffer: gl::types::GLuint,
    texture_handle_buffer: gl::types::GLuint,
    draw_count: usize,
}

impl GpuScene {
    /// Allocates the scene buffers and copies `model` and `materials` into
    /// them. The model is not needed afterwards.
    ///
    /// Fails without touching the GPU if a mesh refers to a material the
    /// table does not have.
    pub fn upload<U: TextureUploader>(
        model: &Model,
        materials: &MaterialTable<U>,
    ) -> Result<GpuScene, Error> {
        for mesh in &model.meshes {
            let material = materials.get_by_id(mesh.material_id)?;
            for slot in TextureSlot::ALL {
                if let Some(texture) = material.texture(slot) {
                    debug_assert!((texture as usize) < materials.texture_handles().len());
                }
            }
        }
        let draw_calls = DrawCalls::from_model(model);
        if draw_calls.is_empty() {
            log::warn!("Scene has no meshes, nothing will be drawn");
        }

        let vertex_buffer = gl::create_buffer(model.vertex_count as usize * size_of::<Vertex>());
        let index_buffer = gl::create_buffer(model.index_count as usize * size_of::<u32>());
        for mesh in &model.meshes {
            log::debug!(
                "Mesh at vertex {} index {}: {} vertices, {} indices, material {}",
                mesh.vertex_offset,
                mesh.index_offset,
                mesh.vertex_count(),
                mesh.index_count(),
                mesh.material_id
            );
            gl::named_buffer_sub_data(
                vertex_buffer,
                mesh.vertex_offset as usize * size_of::<Vertex>(),
                bytemuck::cast_slice(&mesh.vertices),
            );
            gl::named_buffer_sub_data(
                index_buffer,
                mesh.index_offset as usize * size_of::<u32>(),
                bytemuck::cast_slice(&mesh.indices),
            );
        }

        let draw_data_buffer = upload_slice(draw_calls.draw_data());
        let draw_command_buffer = upload_slice(draw_calls.commands());
        let material_buffer = upload_slice(materials.materials());
        let texture_handle_buffer = upload_slice(materials.texture_handles());

        log::info!(
            "Scene uploaded: {} vertices, {} indices, {} draws, {} materials, {} textures",
            model.vertex_count,
            model.index_count,
            draw_calls.len(),
            materials.len(),
            materials.texture_handles().len(),
        );

        Ok(GpuScene {
            vertex_buffer,
            index_buffer,
            draw_data_buffer,
            draw_command_buffer,
            material_buffer,
            texture_handle_buffer,
            draw_count: draw_calls.len(),
        })
    }

    /// Binds every scene buffer to its fixed binding point. Nothing here has
    /// to be rebound between frames.
    pub fn bind(&self) {
        let storage_buffers = [
            (binding::VERTICES, self.vertex_buffer),
            (binding::INDICES, self.index_buffer),
            (binding::DRAW_DATA, self.draw_data_buffer),
            (binding::MATERIALS, self.material_buffer),
            (binding::TEXTURE_HANDLES, self.texture_handle_buffer),
        ];
        for (index, buffer) in storage_buffers {
            gl::call!(gl::BindBufferBase(gl::SHADER_STORAGE_BUFFER, index, buffer));
        }
        gl::call!(gl::BindBuffer(
            gl::DRAW_INDIRECT_BUFFER,
            self.draw_command_buffer
        ));
    }

    /// Issues the single multi-draw covering every mesh.
    pub fn draw(&self) {
        if self.draw_count == 0 {
            return;
        }
        gl::call!(gl::MultiDrawArraysIndirect(
            gl::TRIANGLES,
            std::ptr::null(),
            self.draw_count as i32,
            0,
        ));
    }
}

fn upload_slice<T: bytemuck::Pod>(items: &[T]) -> gl::types::GLuint {
    let bytes: &[u8] = bytemuck::cast_slice(items);
    let buffer = gl::create_buffer(bytes.len());
    gl::named_buffer_sub_data(buffer, 0, bytes);
    buffer
}

impl Drop for GpuScene {
    fn drop(&mut self) {
        let buffers = [
            self.vertex_buffer,
            self.index_buffer,
            self.draw_data_buffer,
            self.draw_command_buffer,
            self.material_buffer,
            self.texture_handle_buffer,
        ];
        gl::call!(gl::DeleteBuffers(buffers.len() as i32, buffers.as_ptr()));
    }
}
