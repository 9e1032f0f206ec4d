//! Texture allocation with immutable storage.
//!
//! `TextureConfig` describes a 2D texture (optionally multisampled) and
//! `create_texture` allocates it. Single-sample textures get
//! `CLAMP_TO_EDGE` wrapping and `NEAREST` filtering; multisample textures
//! have no sampler state.

use crate::error::GlError;

/// Texture coordinate wrap behaviour on both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

impl WrapMode {
    /// The GL wrap constant.
    pub fn gl_enum(self) -> u32 {
        match self {
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
            WrapMode::Repeat => glow::REPEAT,
        }
    }
}

/// Configuration for a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// Sized GL internal format (e.g. `glow::RGBA8`).
    pub internal_format: u32,
    /// Sample count; `Some` allocates a `TEXTURE_2D_MULTISAMPLE`.
    pub samples: Option<u32>,
    /// Number of mip levels to allocate. Ignored for multisample textures.
    pub mipmap_levels: u32,
}

impl TextureConfig {
    fn with_format(width: u32, height: u32, internal_format: u32) -> Self {
        Self {
            width,
            height,
            internal_format,
            samples: None,
            mipmap_levels: 1,
        }
    }

    /// 8-bit normalized RGBA color.
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self::with_format(width, height, glow::RGBA8)
    }

    /// 32-bit float RGBA color.
    pub fn rgba32f(width: u32, height: u32) -> Self {
        Self::with_format(width, height, glow::RGBA32F)
    }

    /// 32-bit float two-channel color, used by the light framebuffer preset.
    pub fn rg32f(width: u32, height: u32) -> Self {
        Self::with_format(width, height, glow::RG32F)
    }

    /// 32-bit depth.
    pub fn depth32(width: u32, height: u32) -> Self {
        Self::with_format(width, height, glow::DEPTH_COMPONENT32F)
    }

    /// Returns a multisampled copy of this config.
    pub fn multisampled(mut self, samples: u32) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Returns a copy with `levels` mip levels.
    pub fn with_mipmaps(mut self, levels: u32) -> Self {
        self.mipmap_levels = levels;
        self
    }

    pub fn is_multisampled(&self) -> bool {
        self.samples.is_some()
    }

    /// The bind target for this texture.
    pub fn target(&self) -> u32 {
        texture_target(self.is_multisampled())
    }

    /// Checks the config against limits that do not depend on the driver.
    ///
    /// # Errors
    ///
    /// `GlError::InvalidDimensions` for a zero width or height,
    /// `GlError::InvalidTexture` for a zero sample count, a mip level count
    /// outside `1..=max_mip_levels`, or a size or sample count beyond
    /// `i32::MAX`.
    pub fn validate(&self) -> Result<(), GlError> {
        if self.width == 0 || self.height == 0 {
            return Err(GlError::InvalidDimensions);
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(GlError::InvalidTexture(format!(
                "size {}x{} exceeds the driver limit",
                self.width, self.height
            )));
        }
        match self.samples {
            Some(0) => {
                return Err(GlError::InvalidTexture(
                    "multisampled texture needs at least one sample".into(),
                ));
            }
            Some(samples) if samples > i32::MAX as u32 => {
                return Err(GlError::InvalidTexture(format!(
                    "{samples} samples exceeds the driver limit"
                )));
            }
            _ => {}
        }
        let max_levels = max_mip_levels(self.width, self.height);
        if !self.is_multisampled() && !(1..=max_levels).contains(&self.mipmap_levels) {
            return Err(GlError::InvalidTexture(format!(
                "{} mip levels requested, {}x{} allows 1..={max_levels}",
                self.mipmap_levels, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// `TEXTURE_2D_MULTISAMPLE` when multisampled, `TEXTURE_2D` otherwise.
pub fn texture_target(multisampled: bool) -> u32 {
    if multisampled {
        glow::TEXTURE_2D_MULTISAMPLE
    } else {
        glow::TEXTURE_2D
    }
}

/// Length of the full mip chain for a `width` x `height` texture.
pub fn max_mip_levels(width: u32, height: u32) -> u32 {
    let largest = width.max(height);
    if largest == 0 {
        0
    } else {
        u32::BITS - largest.leading_zeros()
    }
}

/// Sets wrap and `NEAREST` filtering on the texture bound to `TEXTURE_2D`.
#[allow(unsafe_code)]
pub(crate) fn apply_sampling(gl: &glow::Context, wrap: WrapMode) {
    use glow::HasContext;

    let wrap = wrap.gl_enum() as i32;
    // SAFETY: only sets parameters on the currently bound TEXTURE_2D using
    // valid enum values.
    unsafe {
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
    }
}

/// Allocates a texture with immutable storage from the given configuration.
///
/// # Errors
///
/// Returns the `validate` error for a bad config, or `GlError::Driver` if
/// the context fails to create the texture object.
#[allow(unsafe_code)]
pub fn create_texture(gl: &glow::Context, config: &TextureConfig) -> Result<glow::Texture, GlError> {
    use glow::HasContext;

    config.validate()?;
    let target = config.target();
    let to_i32 = |value: u32, what: &str| {
        i32::try_from(value)
            .map_err(|_| GlError::InvalidTexture(format!("{what} {value} exceeds the driver limit")))
    };
    let width = to_i32(config.width, "width")?;
    let height = to_i32(config.height, "height")?;
    let samples = config.samples.map(|s| to_i32(s, "sample count")).transpose()?;
    let levels = to_i32(config.mipmap_levels, "mip level count")?;

    // SAFETY: glow wraps raw GL calls as unsafe. The config was validated
    // above so every size and level passed to the driver is in range.
    let texture = unsafe { gl.create_texture().map_err(GlError::Driver)? };

    unsafe {
        gl.bind_texture(target, Some(texture));
        match samples {
            Some(samples) => gl.tex_storage_2d_multisample(
                target,
                samples,
                config.internal_format,
                width,
                height,
                false,
            ),
            None => {
                apply_sampling(gl, WrapMode::ClampToEdge);
                gl.tex_storage_2d(
                    target,
                    levels,
                    config.internal_format,
                    width,
                    height,
                );
            }
        }
        gl.bind_texture(target, None);
    }

    log::debug!(
        "created {}x{} texture (format 0x{:04X}, samples {:?})",
        config.width,
        config.height,
        config.internal_format,
        config.samples
    );
    Ok(texture)
}
