#![allow(clippy::all, non_upper_case_globals, non_snake_case, dead_code, unused_imports)]

use std::ffi::c_void;
use std::path::Path;

use crate::error::{Error, ShaderStage};

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

macro_rules! call {
    ($expr:expr) => {{
        #[allow(unused_unsafe)]
        let result = unsafe { $expr };
        if cfg!(debug_assertions) {
            let error = unsafe { $crate::renderer::gl::GetError() };
            if error != $crate::renderer::gl::NO_ERROR {
                let error_number_stringified;
                let error_name = match error {
                    $crate::renderer::gl::INVALID_ENUM => "INVALID_ENUM",
                    $crate::renderer::gl::INVALID_VALUE => "INVALID_VALUE",
                    $crate::renderer::gl::INVALID_OPERATION => "INVALID_OPERATION",
                    $crate::renderer::gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
                    $crate::renderer::gl::INVALID_FRAMEBUFFER_OPERATION => {
                        "INVALID_FRAMEBUFFER_OPERATION"
                    }
                    _ => {
                        error_number_stringified = format!("{error}");
                        &error_number_stringified
                    }
                };
                panic!(
                    "OpenGL error {error_name} at {}:{}:{}",
                    file!(),
                    line!(),
                    column!(),
                );
            }
        }
        result
    }};
}

pub(crate) use call;

/// Creates an immutable-storage buffer of `size` bytes which can be filled
/// with [`named_buffer_sub_data`].
pub fn create_buffer(size: usize) -> types::GLuint {
    let mut buffer = 0;
    call!(CreateBuffers(1, &mut buffer));
    // Zero-sized storage is an INVALID_VALUE, empty scenes still get a buffer.
    call!(NamedBufferStorage(
        buffer,
        size.max(4) as isize,
        std::ptr::null(),
        DYNAMIC_STORAGE_BIT,
    ));
    buffer
}

/// Copies `bytes` into `buffer`, starting `offset` bytes in.
pub fn named_buffer_sub_data(buffer: types::GLuint, offset: usize, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    call!(NamedBufferSubData(
        buffer,
        offset as isize,
        bytes.len() as isize,
        bytes.as_ptr() as *const c_void,
    ));
}

/// Compiles a single shader stage, returning the driver's info log as an
/// error if compilation fails.
pub fn create_shader(
    stage: ShaderStage,
    path: &Path,
    source: &str,
) -> Result<types::GLuint, Error> {
    let shader_type = match stage {
        ShaderStage::Vertex => VERTEX_SHADER,
        ShaderStage::Fragment => FRAGMENT_SHADER,
    };
    let shader = call!(CreateShader(shader_type));
    let sources = [source.as_bytes().as_ptr() as *const types::GLchar];
    let source_lens = [source.len() as types::GLint];
    call!(ShaderSource(
        shader,
        1,
        sources.as_ptr(),
        source_lens.as_ptr()
    ));
    call!(CompileShader(shader));
    let mut compile_status = 0;
    call!(GetShaderiv(shader, COMPILE_STATUS, &mut compile_status));
    if compile_status == FALSE as types::GLint {
        let mut info_log = [0u8; 4096];
        let mut length = 0;
        call!(GetShaderInfoLog(
            shader,
            info_log.len() as types::GLsizei,
            &mut length,
            info_log.as_mut_ptr() as *mut types::GLchar,
        ));
        call!(DeleteShader(shader));
        return Err(Error::ShaderBuild {
            stage: Some(stage),
            path: path.to_path_buf(),
            log: String::from_utf8_lossy(&info_log[..length as usize]).into_owned(),
        });
    }
    Ok(shader)
}

/// Links the given shader stages into a program. The stages are left for the
/// caller to delete.
pub fn create_program(shaders: &[types::GLuint], path: &Path) -> Result<types::GLuint, Error> {
    let program = call!(CreateProgram());
    for &shader in shaders {
        call!(AttachShader(program, shader));
    }
    call!(LinkProgram(program));
    let mut link_status = 0;
    call!(GetProgramiv(program, LINK_STATUS, &mut link_status));
    if link_status == FALSE as types::GLint {
        let mut info_log = [0u8; 4096];
        let mut length = 0;
        call!(GetProgramInfoLog(
            program,
            info_log.len() as types::GLsizei,
            &mut length,
            info_log.as_mut_ptr() as *mut types::GLchar,
        ));
        call!(DeleteProgram(program));
        return Err(Error::ShaderBuild {
            stage: None,
            path: path.to_path_buf(),
            log: String::from_utf8_lossy(&info_log[..length as usize]).into_owned(),
        });
    }
    Ok(program)
}
