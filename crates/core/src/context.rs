//! GPU context wrapper with capability detection.
//!
//! `GpuContext` wraps a `glow::Context` and derives from the driver version
//! which optional pipeline features are usable. Immutable texture storage
//! is required by every texture helper, so a context without it is refused.

use std::collections::HashSet;
use std::path::Path;

use crate::error::GlError;
use crate::framebuffer::{Framebuffer, FramebufferConfig};
use crate::program::{new_compute_program, new_program, GraphicsStages};
use crate::stage::ShaderStage;

/// Features available on a context, derived from its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub texture_storage: bool,
    pub multisample_textures: bool,
    pub geometry_shaders: bool,
    pub tessellation_shaders: bool,
    pub compute_shaders: bool,
}

impl Capabilities {
    /// Derives capabilities from a GL (or GL ES when `embedded`) version and
    /// the context's extension strings.
    ///
    /// On desktop contexts older than 4.2 `GL_ARB_texture_storage` provides
    /// immutable storage; older than 4.3 `GL_ARB_texture_storage_multisample`
    /// provides immutable multisample storage.
    pub fn from_version(
        major: u32,
        minor: u32,
        embedded: bool,
        extensions: &HashSet<String>,
    ) -> Self {
        let at_least = |maj: u32, min: u32| (major, minor) >= (maj, min);
        let has = |name: &str| extensions.contains(name);
        if embedded {
            Self {
                texture_storage: at_least(3, 0),
                multisample_textures: at_least(3, 1),
                geometry_shaders: at_least(3, 2),
                tessellation_shaders: at_least(3, 2),
                compute_shaders: at_least(3, 1),
            }
        } else {
            Self {
                texture_storage: at_least(4, 2) || has("GL_ARB_texture_storage"),
                multisample_textures: at_least(4, 3)
                    || has("GL_ARB_texture_storage_multisample"),
                geometry_shaders: at_least(3, 2),
                tessellation_shaders: at_least(4, 0),
                compute_shaders: at_least(4, 3),
            }
        }
    }

    /// Whether programs using `stage` can be built.
    pub fn supports_stage(&self, stage: ShaderStage) -> bool {
        match stage {
            ShaderStage::Vertex | ShaderStage::Fragment => true,
            ShaderStage::Geometry => self.geometry_shaders,
            ShaderStage::TessControl | ShaderStage::TessEvaluation => self.tessellation_shaders,
            ShaderStage::Compute => self.compute_shaders,
        }
    }
}

/// Wraps a `glow::Context` with detected capabilities.
pub struct GpuContext {
    gl: glow::Context,
    capabilities: Capabilities,
}

impl GpuContext {
    /// Wraps `gl` after checking that it supports immutable texture storage.
    ///
    /// # Errors
    ///
    /// Returns `GlError::Unsupported` if texture storage is unavailable.
    pub fn new(gl: glow::Context) -> Result<Self, GlError> {
        use glow::HasContext;

        let version = gl.version();
        let capabilities = Capabilities::from_version(
            version.major,
            version.minor,
            version.is_embedded,
            gl.supported_extensions(),
        );
        log::info!(
            "GL {}.{}{} ({}): {capabilities:?}",
            version.major,
            version.minor,
            if version.is_embedded { " ES" } else { "" },
            version.vendor_info
        );

        if !capabilities.texture_storage {
            return Err(GlError::Unsupported(format!(
                "immutable texture storage needs GL 4.2 or GL ES 3.0, found {}.{}",
                version.major, version.minor
            )));
        }

        Ok(Self { gl, capabilities })
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Consumes this wrapper and returns the underlying `glow::Context`.
    pub fn into_gl(self) -> glow::Context {
        self.gl
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// # Errors
    ///
    /// Returns `GlError::Unsupported` naming the stage when it cannot be used.
    pub fn require_stage(&self, stage: ShaderStage) -> Result<(), GlError> {
        if self.capabilities.supports_stage(stage) {
            Ok(())
        } else {
            Err(GlError::Unsupported(format!("{stage} shaders")))
        }
    }

    /// Builds a graphics program after checking stage support.
    ///
    /// # Errors
    ///
    /// `GlError::Unsupported` for a stage the context lacks, otherwise any
    /// error from [`new_program`].
    pub fn program(&self, stages: &GraphicsStages) -> Result<glow::Program, GlError> {
        for (stage, _) in stages.attach_plan() {
            self.require_stage(stage)?;
        }
        Ok(new_program(&self.gl, stages)?)
    }

    /// Builds a compute program after checking compute support.
    ///
    /// # Errors
    ///
    /// `GlError::Unsupported` without compute support, otherwise any error
    /// from [`new_compute_program`].
    pub fn compute_program(&self, path: &Path) -> Result<glow::Program, GlError> {
        self.require_stage(ShaderStage::Compute)?;
        Ok(new_compute_program(&self.gl, path)?)
    }

    /// Creates a framebuffer after checking multisample support when needed.
    ///
    /// # Errors
    ///
    /// `GlError::Unsupported` for multisampling without support, otherwise
    /// any error from [`Framebuffer::new`].
    pub fn framebuffer(&self, config: &FramebufferConfig) -> Result<Framebuffer, GlError> {
        if config.samples.is_some() && !self.capabilities.multisample_textures {
            return Err(GlError::Unsupported("multisample textures".into()));
        }
        Framebuffer::new(&self.gl, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn desktop_4_5_supports_everything() {
        let caps = Capabilities::from_version(4, 5, false, &extensions(&[]));
        assert!(caps.texture_storage);
        assert!(caps.multisample_textures);
        assert!(caps.tessellation_shaders);
        assert!(caps.compute_shaders);
        for stage in ShaderStage::all() {
            assert!(caps.supports_stage(stage), "{stage} should be supported");
        }
    }

    #[test]
    fn desktop_3_3_needs_storage_extension() {
        let none = extensions(&[]);
        let storage = extensions(&["GL_ARB_texture_storage"]);
        assert!(!Capabilities::from_version(3, 3, false, &none).texture_storage);
        assert!(Capabilities::from_version(3, 3, false, &storage).texture_storage);
    }

    #[test]
    fn desktop_multisample_storage_needs_4_3() {
        let none = extensions(&[]);
        assert!(!Capabilities::from_version(4, 2, false, &none).multisample_textures);
        assert!(Capabilities::from_version(4, 3, false, &none).multisample_textures);
    }

    #[test]
    fn texture_storage_extension_alone_does_not_enable_multisample() {
        let caps =
            Capabilities::from_version(3, 3, false, &extensions(&["GL_ARB_texture_storage"]));
        assert!(caps.texture_storage);
        assert!(!caps.multisample_textures);
    }

    #[test]
    fn multisample_storage_extension_enables_multisample_before_4_3() {
        let caps = Capabilities::from_version(
            3,
            3,
            false,
            &extensions(&["GL_ARB_texture_storage", "GL_ARB_texture_storage_multisample"]),
        );
        assert!(caps.multisample_textures);
    }

    #[test]
    fn desktop_4_1_has_tessellation_but_no_compute() {
        let caps = Capabilities::from_version(4, 1, false, &extensions(&["GL_ARB_texture_storage"]));
        assert!(caps.supports_stage(ShaderStage::TessControl));
        assert!(!caps.supports_stage(ShaderStage::Compute));
    }

    #[test]
    fn es_3_0_is_vertex_fragment_only() {
        let caps = Capabilities::from_version(3, 0, true, &extensions(&[]));
        assert!(caps.texture_storage);
        assert!(!caps.multisample_textures);
        assert!(caps.supports_stage(ShaderStage::Vertex));
        assert!(caps.supports_stage(ShaderStage::Fragment));
        assert!(!caps.supports_stage(ShaderStage::Geometry));
        assert!(!caps.supports_stage(ShaderStage::Compute));
    }

    #[test]
    fn es_3_1_adds_compute_and_multisample() {
        let caps = Capabilities::from_version(3, 1, true, &extensions(&[]));
        assert!(caps.compute_shaders);
        assert!(caps.multisample_textures);
        assert!(!caps.tessellation_shaders);
    }

    #[test]
    fn es_3_2_adds_geometry_and_tessellation() {
        let caps = Capabilities::from_version(3, 2, true, &extensions(&[]));
        assert!(caps.geometry_shaders);
        assert!(caps.tessellation_shaders);
    }

    #[test]
    fn gpu_context_struct_compiles_with_expected_api() {
        fn _assert_api(ctx: &GpuContext) {
            let _gl: &glow::Context = ctx.gl();
            let _caps: Capabilities = ctx.capabilities();
            let _ok: Result<(), GlError> = ctx.require_stage(ShaderStage::Compute);
        }
    }

    #[test]
    #[ignore = "requires GL context"]
    fn new_refuses_context_without_texture_storage() {
        // Would test: a GL 3.3 context without ARB_texture_storage is refused.
    }
}
