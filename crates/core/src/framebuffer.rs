//! Framebuffer objects assembled from color and depth textures.
//!
//! `create_fbo_with_textures` attaches caller-owned textures. `Framebuffer`
//! allocates its own attachments from a `FramebufferConfig` using one of two
//! presets: `Standard` (RGBA8 or RGBA32F color) and `Light` (RG32F color,
//! single mip level). Both presets use 32-bit float depth.

use serde::{Deserialize, Serialize};

use crate::error::GlError;
use crate::texture::{create_texture, texture_target, TextureConfig};

/// Attachment format preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FramebufferPreset {
    #[default]
    Standard,
    Light,
}

fn default_true() -> bool {
    true
}

fn default_mipmap_levels() -> u32 {
    1
}

/// Describes a framebuffer and the attachments it should own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub preset: FramebufferPreset,
    /// Sample count for multisampled attachments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<u32>,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_true")]
    pub depth: bool,
    /// Standard preset only: RGBA32F instead of RGBA8 color.
    #[serde(default)]
    pub floating_point: bool,
    /// Standard preset only: mip levels of the color attachment.
    #[serde(default = "default_mipmap_levels")]
    pub mipmap_levels: u32,
}

impl FramebufferConfig {
    /// Standard preset with RGBA8 color and depth, single-sampled.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            preset: FramebufferPreset::Standard,
            samples: None,
            color: true,
            depth: true,
            floating_point: false,
            mipmap_levels: 1,
        }
    }

    /// Light preset with RG32F color and depth, single-sampled.
    pub fn light(width: u32, height: u32) -> Self {
        Self {
            preset: FramebufferPreset::Light,
            ..Self::new(width, height)
        }
    }

    /// The texture config for the color attachment.
    pub fn color_texture(&self) -> TextureConfig {
        let config = match self.preset {
            FramebufferPreset::Standard if self.floating_point => {
                TextureConfig::rgba32f(self.width, self.height).with_mipmaps(self.mipmap_levels)
            }
            FramebufferPreset::Standard => {
                TextureConfig::rgba8(self.width, self.height).with_mipmaps(self.mipmap_levels)
            }
            FramebufferPreset::Light => TextureConfig::rg32f(self.width, self.height),
        };
        self.apply_samples(config)
    }

    /// The texture config for the depth attachment.
    pub fn depth_texture(&self) -> TextureConfig {
        self.apply_samples(TextureConfig::depth32(self.width, self.height))
    }

    fn apply_samples(&self, config: TextureConfig) -> TextureConfig {
        match self.samples {
            Some(samples) => config.multisampled(samples),
            None => config,
        }
    }
}

/// Creates a framebuffer with the given textures attached.
///
/// `color` goes to `COLOR_ATTACHMENT0` and `depth` to `DEPTH_ATTACHMENT`.
/// The textures stay owned by the caller. Completeness is checked only when
/// at least one texture is attached. The default framebuffer is bound again
/// before returning.
///
/// # Errors
///
/// Returns `GlError::Driver` if the framebuffer cannot be created, or
/// `GlError::IncompleteFramebuffer` (after deleting it) if it is incomplete.
#[allow(unsafe_code)]
pub fn create_fbo_with_textures(
    gl: &glow::Context,
    color: Option<glow::Texture>,
    depth: Option<glow::Texture>,
    multisampled: bool,
) -> Result<glow::Framebuffer, GlError> {
    use glow::HasContext;

    let target = texture_target(multisampled);

    // SAFETY: glow wraps raw GL calls as unsafe. Texture handles come from
    // the caller; the framebuffer is deleted if it ends up incomplete.
    let fbo = unsafe { gl.create_framebuffer().map_err(GlError::Driver)? };

    let status = unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
        if let Some(texture) = color {
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                target,
                Some(texture),
                0,
            );
        }
        if let Some(texture) = depth {
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                target,
                Some(texture),
                0,
            );
        }
        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        status
    };

    let attached = color.is_some() || depth.is_some();
    if attached && status != glow::FRAMEBUFFER_COMPLETE {
        unsafe { gl.delete_framebuffer(fbo) };
        return Err(GlError::IncompleteFramebuffer(status));
    }

    Ok(fbo)
}

/// An off-screen framebuffer that owns its attachment textures.
pub struct Framebuffer {
    fbo: glow::Framebuffer,
    color: Option<glow::Texture>,
    depth: Option<glow::Texture>,
    width: u32,
    height: u32,
    samples: Option<u32>,
}

impl Framebuffer {
    /// Allocates the attachments requested by `config` and assembles them
    /// into a framebuffer.
    ///
    /// # Errors
    ///
    /// Returns any texture validation or creation error, or the
    /// framebuffer creation error. Already created textures are deleted
    /// before the error is returned.
    #[allow(unsafe_code)]
    pub fn new(gl: &glow::Context, config: &FramebufferConfig) -> Result<Self, GlError> {
        use glow::HasContext;

        let mut owned = Vec::with_capacity(2);
        let result = Self::allocate(gl, config, &mut owned);
        if result.is_err() {
            // SAFETY: every handle in `owned` is a live texture created above
            // and not attached to any surviving framebuffer.
            unsafe {
                for texture in owned {
                    gl.delete_texture(texture);
                }
            }
        }
        result
    }

    fn allocate(
        gl: &glow::Context,
        config: &FramebufferConfig,
        owned: &mut Vec<glow::Texture>,
    ) -> Result<Self, GlError> {
        let color = if config.color {
            let texture = create_texture(gl, &config.color_texture())?;
            owned.push(texture);
            Some(texture)
        } else {
            None
        };
        let depth = if config.depth {
            let texture = create_texture(gl, &config.depth_texture())?;
            owned.push(texture);
            Some(texture)
        } else {
            None
        };

        let fbo = create_fbo_with_textures(gl, color, depth, config.samples.is_some())?;
        log::debug!(
            "created {:?} framebuffer {}x{} (color: {}, depth: {}, samples: {:?})",
            config.preset,
            config.width,
            config.height,
            config.color,
            config.depth,
            config.samples
        );

        Ok(Self {
            fbo,
            color,
            depth,
            width: config.width,
            height: config.height,
            samples: config.samples,
        })
    }

    /// Binds this framebuffer as the draw target and sets the viewport to
    /// its full size.
    #[allow(unsafe_code)]
    pub fn bind(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.fbo is a valid framebuffer handle created in new().
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            gl.viewport(0, 0, self.width as i32, self.height as i32);
        }
    }

    /// Binds the default framebuffer.
    #[allow(unsafe_code)]
    pub fn unbind(gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: binding `None` restores the default framebuffer.
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, None) };
    }

    pub fn fbo(&self) -> glow::Framebuffer {
        self.fbo
    }

    /// The color attachment, if one was requested.
    pub fn color_texture(&self) -> Option<glow::Texture> {
        self.color
    }

    /// The depth attachment, if one was requested.
    pub fn depth_texture(&self) -> Option<glow::Texture> {
        self.depth
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_multisampled(&self) -> bool {
        self.samples.is_some()
    }

    /// Deletes the framebuffer and its attachments.
    ///
    /// GL objects are not freed on drop; call this for deterministic cleanup.
    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: all handles were created in new() and are owned by self.
        unsafe {
            gl.delete_framebuffer(self.fbo);
            for texture in [self.color, self.depth].into_iter().flatten() {
                gl.delete_texture(texture);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_preset_uses_rgba8_color() {
        let config = FramebufferConfig::new(800, 600);
        let color = config.color_texture();
        assert_eq!(color.internal_format, glow::RGBA8);
        assert_eq!((color.width, color.height), (800, 600));
    }

    #[test]
    fn floating_point_standard_uses_rgba32f() {
        let config = FramebufferConfig {
            floating_point: true,
            ..FramebufferConfig::new(64, 64)
        };
        assert_eq!(config.color_texture().internal_format, glow::RGBA32F);
    }

    #[test]
    fn standard_color_carries_mip_levels_but_depth_does_not() {
        let config = FramebufferConfig {
            mipmap_levels: 4,
            ..FramebufferConfig::new(64, 64)
        };
        assert_eq!(config.color_texture().mipmap_levels, 4);
        assert_eq!(config.depth_texture().mipmap_levels, 1);
    }

    #[test]
    fn light_preset_uses_rg32f_single_level() {
        let config = FramebufferConfig {
            mipmap_levels: 4,
            floating_point: true,
            ..FramebufferConfig::light(128, 128)
        };
        let color = config.color_texture();
        assert_eq!(color.internal_format, glow::RG32F);
        assert_eq!(color.mipmap_levels, 1);
    }

    #[test]
    fn both_presets_use_float_depth() {
        for config in [FramebufferConfig::new(8, 8), FramebufferConfig::light(8, 8)] {
            assert_eq!(config.depth_texture().internal_format, glow::DEPTH_COMPONENT32F);
        }
    }

    #[test]
    fn samples_propagate_to_both_attachments() {
        let config = FramebufferConfig {
            samples: Some(4),
            ..FramebufferConfig::new(32, 32)
        };
        assert_eq!(config.color_texture().samples, Some(4));
        assert_eq!(config.depth_texture().samples, Some(4));
        assert_eq!(config.depth_texture().target(), glow::TEXTURE_2D_MULTISAMPLE);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: FramebufferConfig =
            serde_json::from_str(r#"{"width": 320, "height": 240}"#).unwrap();
        assert_eq!(config, FramebufferConfig::new(320, 240));
    }

    #[test]
    fn deserializes_light_preset_without_depth() {
        let json = r#"{"width": 16, "height": 16, "preset": "light", "depth": false, "samples": 8}"#;
        let config: FramebufferConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.preset, FramebufferPreset::Light);
        assert!(config.color);
        assert!(!config.depth);
        assert_eq!(config.samples, Some(8));
    }

    #[test]
    fn framebuffer_struct_has_expected_fields() {
        fn _assert_fields(fb: &Framebuffer) {
            let _fbo = fb.fbo;
            let _color = fb.color;
            let _depth = fb.depth;
            let _size = (fb.width, fb.height);
            let _samples = fb.samples;
        }
    }

    #[test]
    #[ignore = "requires GL context"]
    fn new_creates_complete_framebuffer() {
        // Would test: Framebuffer::new(gl, &FramebufferConfig::new(512, 512))
        // succeeds with both attachments present.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn create_fbo_without_attachments_skips_completeness_check() {
        // Would test: create_fbo_with_textures(gl, None, None, false) is Ok.
    }
}
