//! Textures loaded from image files.
//!
//! Decoding is done by the `image` crate; every supported format is
//! converted to tightly packed RGBA8 before upload.

use std::path::Path;

use glam::Vec2;

use crate::error::GlError;
use crate::texture::{apply_sampling, WrapMode};

/// A texture uploaded from an image, together with its pixel size.
///
/// The handle owns the texture; [`ImageTexture::destroy`] consumes it.
#[derive(Debug)]
pub struct ImageTexture {
    pub texture: glow::Texture,
    pub size: Vec2,
}

impl ImageTexture {
    /// Deletes the texture.
    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.texture was created by create_image_texture.
        unsafe { gl.delete_texture(self.texture) };
    }
}

/// Decodes an image file into RGBA8.
///
/// # Errors
///
/// Returns `GlError::Io` if the file cannot be opened, `GlError::Image` if
/// it cannot be decoded, and `GlError::InvalidDimensions` for an empty image.
pub fn load_rgba(path: &Path) -> Result<image::RgbaImage, GlError> {
    let decoded = image::ImageReader::open(path)
        .map_err(|e| GlError::Io(format!("{}: {e}", path.display())))?
        .with_guessed_format()
        .map_err(|e| GlError::Io(format!("{}: {e}", path.display())))?
        .decode()
        .map_err(|e| GlError::Image(format!("{}: {e}", path.display())))?;

    let rgba = decoded.into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(GlError::InvalidDimensions);
    }
    Ok(rgba)
}

/// Uploads an already decoded RGBA8 image as a `NEAREST`-filtered texture.
///
/// # Errors
///
/// Returns `GlError::InvalidDimensions` for an empty image or
/// `GlError::Driver` if the texture cannot be created.
#[allow(unsafe_code)]
pub fn upload_rgba(
    gl: &glow::Context,
    image: &image::RgbaImage,
    wrap: WrapMode,
) -> Result<ImageTexture, GlError> {
    use glow::HasContext;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(GlError::InvalidDimensions);
    }
    let w = i32::try_from(width).map_err(|_| GlError::InvalidDimensions)?;
    let h = i32::try_from(height).map_err(|_| GlError::InvalidDimensions)?;

    // SAFETY: glow wraps raw GL calls as unsafe. The pixel slice holds
    // exactly width * height * 4 bytes, matching the RGBA/UNSIGNED_BYTE upload.
    let texture = unsafe { gl.create_texture().map_err(GlError::Driver)? };

    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        apply_sampling(gl, wrap);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            w,
            h,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(image.as_raw())),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }

    Ok(ImageTexture {
        texture,
        size: Vec2::new(width as f32, height as f32),
    })
}

/// Decodes `path` and uploads it as a texture.
///
/// # Errors
///
/// Returns the `load_rgba` or `upload_rgba` error.
pub fn create_image_texture(
    gl: &glow::Context,
    path: &Path,
    wrap: WrapMode,
) -> Result<ImageTexture, GlError> {
    let rgba = load_rgba(path)?;
    let texture = upload_rgba(gl, &rgba, wrap)?;
    log::debug!(
        "loaded image texture {} ({}x{}, {:?})",
        path.display(),
        rgba.width(),
        rgba.height(),
        wrap
    );
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([x as u8, y as u8, 200])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn load_rgba_converts_rgb_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        write_png(&path, 5, 3);

        let rgba = load_rgba(&path).unwrap();
        assert_eq!(rgba.dimensions(), (5, 3));
        assert_eq!(rgba.as_raw().len(), 5 * 3 * 4);
        assert_eq!(rgba.get_pixel(4, 2).0, [4, 2, 200, 255]);
    }

    #[test]
    fn load_rgba_guesses_format_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("tile.png");
        write_png(&png, 2, 2);
        let renamed = dir.path().join("tile.bin");
        std::fs::rename(&png, &renamed).unwrap();

        assert_eq!(load_rgba(&renamed).unwrap().dimensions(), (2, 2));
    }

    #[test]
    fn load_rgba_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rgba(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, GlError::Io(_)), "got: {err}");
    }

    #[test]
    fn load_rgba_garbage_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = load_rgba(&path).unwrap_err();
        assert!(matches!(err, GlError::Image(_)), "got: {err}");
        assert!(err.to_string().contains("broken.png"), "got: {err}");
    }

    #[test]
    fn image_texture_is_not_copy_or_clone() {
        // Resolves only when exactly one impl applies, i.e. T is neither
        // Copy nor Clone.
        trait AmbiguousIfDuplicable<A> {
            fn check() {}
        }
        impl<T: ?Sized> AmbiguousIfDuplicable<()> for T {}
        impl<T: ?Sized + Clone> AmbiguousIfDuplicable<u8> for T {}

        <ImageTexture as AmbiguousIfDuplicable<_>>::check();
        let _destroy: fn(ImageTexture, &glow::Context) = ImageTexture::destroy;
    }

    #[test]
    #[ignore = "requires GL context"]
    fn create_image_texture_reports_pixel_size() {
        // Would test: size == Vec2::new(width, height) of the source image.
    }
}
