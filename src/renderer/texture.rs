use std::ffi::c_void;
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::Error;
use crate::renderer::gl;

/// How many resident texture handles the shaders' handle table can hold.
pub const MAX_TEXTURES: usize = 256;

/// A bindless texture handle as returned by `glGetTextureHandleARB`. Once
/// resident it is valid for the rest of the process.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct TextureHandle(pub u64);

/// RGBA8 pixels, rows tightly packed, first row at the top of the image.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn open(path: &Path) -> Result<DecodedImage, Error> {
        let image = image::open(path)
            .map_err(|err| Error::resource(path, err))?
            .into_rgba8();
        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }
}

/// Turns decoded images into resident bindless textures.
pub trait TextureUploader {
    fn upload(&mut self, image: &DecodedImage) -> Result<TextureHandle, Error>;
}

/// Uploads through the current OpenGL context. The textures are never
/// deleted: their handles stay resident until the context goes away.
pub struct GlTextureUploader {
    textures: Vec<gl::types::GLuint>,
}

impl GlTextureUploader {
    /// Fails if the driver did not expose `GL_ARB_bindless_texture`.
    pub fn new() -> Result<GlTextureUploader, Error> {
        if !gl::GetTextureHandleARB::is_loaded() || !gl::MakeTextureHandleResidentARB::is_loaded()
        {
            return Err(Error::Unsupported(
                "GL_ARB_bindless_texture is not available".to_string(),
            ));
        }
        Ok(GlTextureUploader {
            textures: Vec::new(),
        })
    }
}

impl TextureUploader for GlTextureUploader {
    fn upload(&mut self, image: &DecodedImage) -> Result<TextureHandle, Error> {
        let mut texture = 0;
        gl::call!(gl::CreateTextures(gl::TEXTURE_2D, 1, &mut texture));
        gl::call!(gl::TextureParameteri(
            texture,
            gl::TEXTURE_MIN_FILTER,
            gl::LINEAR as i32
        ));
        gl::call!(gl::TextureParameteri(
            texture,
            gl::TEXTURE_MAG_FILTER,
            gl::LINEAR as i32
        ));
        gl::call!(gl::TextureStorage2D(
            texture,
            1,
            gl::RGBA8,
            image.width as i32,
            image.height as i32,
        ));
        gl::call!(gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1));
        gl::call!(gl::TextureSubImage2D(
            texture,
            0,
            0,
            0,
            image.width as i32,
            image.height as i32,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            image.pixels.as_ptr() as *const c_void,
        ));

        let handle = gl::call!(gl::GetTextureHandleARB(texture));
        gl::call!(gl::MakeTextureHandleResidentARB(handle));
        self.textures.push(texture);
        Ok(TextureHandle(handle))
    }
}

impl Drop for GlTextureUploader {
    fn drop(&mut self) {
        for &texture in &self.textures {
            let handle = gl::call!(gl::GetTextureHandleARB(texture));
            gl::call!(gl::MakeTextureHandleNonResidentARB(handle));
        }
        gl::call!(gl::DeleteTextures(
            self.textures.len() as i32,
            self.textures.as_ptr(),
        ));
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn decoded_images_are_rgba8() {
        let dir = scratch_dir("decode");
        let path = dir.join("checker.png");
        write_png(&path, 3, 5);

        let image = DecodedImage::open(&path).unwrap();
        assert_eq!((3, 5), (image.width, image.height));
        assert_eq!(3 * 5 * 4, image.pixels.len());
    }

    #[test]
    fn missing_images_name_the_path() {
        let dir = scratch_dir("missing");
        let path = dir.join("nope.png");
        match DecodedImage::open(&path) {
            Err(Error::ResourceLoad { path: failed, .. }) => assert_eq!(path, failed),
            other => panic!("expected a resource load failure, got {:?}", other.err()),
        }
    }
}
