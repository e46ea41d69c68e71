use std::ffi::{c_void, CStr};
use std::mem::size_of;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use sdl2::video::{SwapInterval, Window};
use sdl2::VideoSubsystem;

use crate::camera::Camera;
use crate::config::Config;
use crate::error::Error;

mod draw_calls;
mod gl;
mod gpu_scene;
mod import;
mod material;
mod model;
mod program;
mod texture;

use gpu_scene::{binding, GpuScene};
use material::MaterialTable;
use texture::GlTextureUploader;

/// Contents of the per-frame uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct PerFrameData {
    view: Mat4,
    projection: Mat4,
}

/// Owns every GPU object of the session. The scene is loaded and bound once
/// in [`Renderer::new`]; each frame only rewrites the camera matrices and
/// issues one multi-draw.
pub struct Renderer {
    vao: gl::types::GLuint,
    program: gl::types::GLuint,
    per_frame_buffer: gl::types::GLuint,
    scene: GpuScene,
    // Keeps the texture handles referenced by the scene's materials resident.
    _materials: MaterialTable<GlTextureUploader>,
    clear_color: [f32; 4],
    viewport: (i32, i32),
}

impl Renderer {
    pub fn new(
        video: &VideoSubsystem,
        window: &Window,
        config: &Config,
        resource_dir: &Path,
    ) -> Result<Renderer, Error> {
        gl::load_with(|s| video.gl_get_proc_address(s) as *const c_void);
        let swap_interval = if config.window.vsync {
            SwapInterval::VSync
        } else {
            SwapInterval::Immediate
        };
        if let Err(err) = video.gl_set_swap_interval(swap_interval) {
            log::warn!("Could not set swap interval: {err}");
        }
        log::info!(
            "OpenGL {} on {}",
            gl_string(gl::VERSION),
            gl_string(gl::RENDERER)
        );

        let mut materials = MaterialTable::new(GlTextureUploader::new()?);
        let scene_root = resource_dir.join(&config.asset_dir);
        let model = import::import_model(&mut materials, &scene_root, &config.scene_file)?;
        let scene = GpuScene::upload(&model, &materials)?;
        drop(model);

        let program = program::create_program(
            &resource_dir.join(&config.vertex_shader),
            &resource_dir.join(&config.fragment_shader),
        )?;

        // Vertices are pulled from storage buffers, the VAO stays empty.
        let mut vao = 0;
        gl::call!(gl::CreateVertexArrays(1, &mut vao));

        let per_frame_buffer = gl::create_buffer(size_of::<PerFrameData>());
        gl::call!(gl::BindBufferRange(
            gl::UNIFORM_BUFFER,
            binding::PER_FRAME,
            per_frame_buffer,
            0,
            size_of::<PerFrameData>() as isize,
        ));

        gl::call!(gl::Disable(gl::CULL_FACE));
        gl::call!(gl::Enable(gl::DEPTH_TEST));
        gl::call!(gl::Enable(gl::BLEND));
        gl::call!(gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA));

        gl::call!(gl::UseProgram(program));
        gl::call!(gl::BindVertexArray(vao));
        scene.bind();

        let (w, h) = window.drawable_size();
        let mut renderer = Renderer {
            vao,
            program,
            per_frame_buffer,
            scene,
            _materials: materials,
            clear_color: config.clear_color,
            viewport: (0, 0),
        };
        renderer.resize(w as i32, h as i32);
        Ok(renderer)
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.viewport = (width, height);
        gl::call!(gl::Viewport(0, 0, width, height));
    }

    pub fn render(&mut self, camera: &Camera) {
        let (width, height) = self.viewport;
        let aspect_ratio = width.max(1) as f32 / height.max(1) as f32;
        let per_frame_data = PerFrameData {
            view: camera.view(),
            projection: camera.projection(aspect_ratio),
        };
        gl::named_buffer_sub_data(
            self.per_frame_buffer,
            0,
            bytemuck::bytes_of(&per_frame_data),
        );

        let [r, g, b, a] = self.clear_color;
        gl::call!(gl::ClearColor(r, g, b, a));
        gl::call!(gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT));
        self.scene.draw();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        gl::call!(gl::DeleteVertexArrays(1, &self.vao));
        gl::call!(gl::DeleteBuffers(1, &self.per_frame_buffer));
        gl::call!(gl::DeleteProgram(self.program));
    }
}

fn gl_string(name: gl::types::GLenum) -> String {
    let string = gl::call!(gl::GetString(name));
    if string.is_null() {
        return String::from("<unknown>");
    }
    unsafe { CStr::from_ptr(string as *const _) }
        .to_string_lossy()
        .into_owned()
}
