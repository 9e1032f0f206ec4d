//! Shader pipeline stages and their driver constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

/// Conventional GLSL file extensions, one per stage.
const EXTENSIONS: &[(&str, ShaderStage)] = &[
    ("vert", ShaderStage::Vertex),
    ("tesc", ShaderStage::TessControl),
    ("tese", ShaderStage::TessEvaluation),
    ("geom", ShaderStage::Geometry),
    ("frag", ShaderStage::Fragment),
    ("comp", ShaderStage::Compute),
];

impl ShaderStage {
    /// The GL shader type passed to `glCreateShader`.
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }

    /// Human-readable stage name used in errors and log lines.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        }
    }

    /// The conventional file extension for this stage, without the dot.
    pub fn extension(self) -> &'static str {
        EXTENSIONS
            .iter()
            .find(|(_, stage)| *stage == self)
            .map(|(ext, _)| *ext)
            .unwrap_or("glsl")
    }

    /// Guesses the stage from a file extension (`.vert`, `.frag`, ...).
    ///
    /// Matching is case-insensitive. Returns `None` for unknown or missing
    /// extensions such as `.glsl`.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, stage)| *stage)
    }

    /// All stages in declaration order.
    pub fn all() -> [ShaderStage; 6] {
        [
            ShaderStage::Vertex,
            ShaderStage::TessControl,
            ShaderStage::TessEvaluation,
            ShaderStage::Geometry,
            ShaderStage::Fragment,
            ShaderStage::Compute,
        ]
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn gl_enum_matches_driver_constants() {
        assert_eq!(ShaderStage::Vertex.gl_enum(), glow::VERTEX_SHADER);
        assert_eq!(ShaderStage::Fragment.gl_enum(), glow::FRAGMENT_SHADER);
        assert_eq!(ShaderStage::Compute.gl_enum(), glow::COMPUTE_SHADER);
        assert_eq!(
            ShaderStage::TessEvaluation.gl_enum(),
            glow::TESS_EVALUATION_SHADER
        );
    }

    #[test]
    fn gl_enums_are_distinct() {
        let stages = ShaderStage::all();
        for (i, a) in stages.iter().enumerate() {
            for b in &stages[i + 1..] {
                assert_ne!(a.gl_enum(), b.gl_enum(), "{a} and {b} share an enum");
            }
        }
    }

    #[test]
    fn from_extension_recognizes_every_stage() {
        for stage in ShaderStage::all() {
            let path = PathBuf::from(format!("shaders/main.{}", stage.extension()));
            assert_eq!(ShaderStage::from_extension(&path), Some(stage));
        }
    }

    #[test]
    fn from_extension_is_case_insensitive() {
        assert_eq!(
            ShaderStage::from_extension(Path::new("BLUR.FRAG")),
            Some(ShaderStage::Fragment)
        );
    }

    #[test]
    fn from_extension_rejects_unknown_and_missing() {
        assert_eq!(ShaderStage::from_extension(Path::new("common.glsl")), None);
        assert_eq!(ShaderStage::from_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn display_uses_readable_name() {
        assert_eq!(ShaderStage::TessControl.to_string(), "tessellation control");
    }

    #[test]
    fn deserializes_from_kebab_case() {
        let stage: ShaderStage = serde_json::from_str("\"tess-evaluation\"").unwrap();
        assert_eq!(stage, ShaderStage::TessEvaluation);
    }
}
