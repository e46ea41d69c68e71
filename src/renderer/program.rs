use std::path::Path;

use crate::error::{Error, ShaderStage};
use crate::renderer::gl;

/// Reads a shader stage's source text from disk.
pub fn load_shader_source(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|err| Error::resource(path, err))
}

/// Compiles and links the program that draws the aggregated scene.
pub fn create_program(
    vertex_shader_path: &Path,
    fragment_shader_path: &Path,
) -> Result<gl::types::GLuint, Error> {
    let vertex_source = load_shader_source(vertex_shader_path)?;
    let fragment_source = load_shader_source(fragment_shader_path)?;

    let vertex_shader = gl::create_shader(ShaderStage::Vertex, vertex_shader_path, &vertex_source)?;
    let fragment_shader =
        match gl::create_shader(ShaderStage::Fragment, fragment_shader_path, &fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                gl::call!(gl::DeleteShader(vertex_shader));
                return Err(err);
            }
        };
    let program = gl::create_program(&[vertex_shader, fragment_shader], fragment_shader_path);
    gl::call!(gl::DeleteShader(vertex_shader));
    gl::call!(gl::DeleteShader(fragment_shader));
    let program = program?;
    log::info!(
        "Built shader program from {} and {}",
        vertex_shader_path.display(),
        fragment_shader_path.display()
    );
    Ok(program)
}
