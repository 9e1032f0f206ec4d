//! JSON asset manifests naming shader programs and framebuffers.
//!
//! ```json
//! {
//!   "programs": {
//!     "scene": { "vertex": "scene.vert", "fragment": "scene.frag" },
//!     "blur": { "compute": "blur.comp" }
//!   },
//!   "framebuffers": {
//!     "main": { "width": 1280, "height": 720, "samples": 4 },
//!     "light": { "width": 512, "height": 512, "preset": "light" }
//!   }
//! }
//! ```
//!
//! Stage paths are relative to the directory holding the manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::GpuContext;
use crate::error::GlError;
use crate::framebuffer::{Framebuffer, FramebufferConfig};
use crate::program::GraphicsStages;
use crate::stage::ShaderStage;

/// A program entry: either a single compute stage or a graphics pipeline.
///
/// An entry naming `compute` must not name any graphics stage, and a
/// graphics entry needs both `vertex` and `fragment`. Unknown keys are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProgramEntry", into = "ProgramEntry")]
pub enum ProgramSpec {
    Compute { compute: PathBuf },
    Graphics(GraphicsStages),
}

/// On-disk shape of a program entry, before the stage combination is checked.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProgramEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compute: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vertex: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fragment: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geometry: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tess_control: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tess_evaluation: Option<PathBuf>,
}

impl TryFrom<ProgramEntry> for ProgramSpec {
    type Error = String;

    fn try_from(entry: ProgramEntry) -> Result<Self, Self::Error> {
        let ProgramEntry {
            compute,
            vertex,
            fragment,
            geometry,
            tess_control,
            tess_evaluation,
        } = entry;

        if let Some(compute) = compute {
            let graphics: Vec<&str> = [
                ("vertex", vertex.is_some()),
                ("fragment", fragment.is_some()),
                ("geometry", geometry.is_some()),
                ("tess_control", tess_control.is_some()),
                ("tess_evaluation", tess_evaluation.is_some()),
            ]
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect();
            if !graphics.is_empty() {
                return Err(format!(
                    "compute program cannot also name graphics stages ({})",
                    graphics.join(", ")
                ));
            }
            return Ok(ProgramSpec::Compute { compute });
        }

        let vertex = vertex.ok_or("graphics program needs a 'vertex' stage")?;
        let fragment = fragment.ok_or("graphics program needs a 'fragment' stage")?;
        Ok(ProgramSpec::Graphics(GraphicsStages {
            vertex,
            fragment,
            geometry,
            tess_control,
            tess_evaluation,
        }))
    }
}

impl From<ProgramSpec> for ProgramEntry {
    fn from(spec: ProgramSpec) -> Self {
        match spec {
            ProgramSpec::Compute { compute } => ProgramEntry {
                compute: Some(compute),
                ..ProgramEntry::default()
            },
            ProgramSpec::Graphics(stages) => ProgramEntry {
                compute: None,
                vertex: Some(stages.vertex),
                fragment: Some(stages.fragment),
                geometry: stages.geometry,
                tess_control: stages.tess_control,
                tess_evaluation: stages.tess_evaluation,
            },
        }
    }
}

impl ProgramSpec {
    /// Stages in attach order with paths joined onto `base`.
    pub fn resolved_stages(&self, base: &Path) -> Vec<(ShaderStage, PathBuf)> {
        match self {
            ProgramSpec::Compute { compute } => vec![(ShaderStage::Compute, base.join(compute))],
            ProgramSpec::Graphics(stages) => stages
                .resolved(base)
                .attach_plan()
                .into_iter()
                .map(|(stage, path)| (stage, path.to_path_buf()))
                .collect(),
        }
    }
}

/// Non-fatal findings from [`Manifest::validate`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

/// Parsed asset manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub programs: BTreeMap<String, ProgramSpec>,
    #[serde(default)]
    pub framebuffers: BTreeMap<String, FramebufferConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Manifest {
    /// Parses manifest JSON; relative stage paths resolve against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `GlError::Manifest` for malformed JSON.
    pub fn from_json_str(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self, GlError> {
        let mut manifest: Manifest =
            serde_json::from_str(json).map_err(|e| GlError::Manifest(e.to_string()))?;
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// `GlError::Io` if the file cannot be read, `GlError::Manifest` if it
    /// is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self, GlError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| GlError::Io(format!("{}: {e}", path.display())))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json_str(&json, base)
    }

    /// Directory that relative stage paths resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Stages of the named program, resolved against the manifest directory.
    pub fn program_stages(&self, name: &str) -> Option<Vec<(ShaderStage, PathBuf)>> {
        self.programs
            .get(name)
            .map(|spec| spec.resolved_stages(&self.base_dir))
    }

    /// Checks everything that can be checked without a GL context.
    ///
    /// Missing stage files and invalid framebuffer sizes are errors; a file
    /// extension naming a different stage and a lone tessellation stage are
    /// warnings.
    ///
    /// # Errors
    ///
    /// Returns `GlError::Manifest` listing every problem found.
    pub fn validate(&self) -> Result<ValidationReport, GlError> {
        let mut problems = Vec::new();
        let mut report = ValidationReport::default();

        for (name, spec) in &self.programs {
            if let ProgramSpec::Graphics(stages) = spec {
                if stages.has_partial_tessellation() {
                    report.warnings.push(format!(
                        "program '{name}': lone tessellation stage will be ignored"
                    ));
                }
            }
            for (stage, path) in spec.resolved_stages(&self.base_dir) {
                if !path.is_file() {
                    problems.push(format!(
                        "program '{name}': {stage} source {} not found",
                        path.display()
                    ));
                }
                if let Some(guessed) = ShaderStage::from_extension(&path) {
                    if guessed != stage {
                        report.warnings.push(format!(
                            "program '{name}': {} looks like a {guessed} shader but is used as {stage}",
                            path.display()
                        ));
                    }
                }
            }
        }

        for (name, config) in &self.framebuffers {
            let mut textures = Vec::with_capacity(2);
            if config.color {
                textures.push(config.color_texture());
            }
            if config.depth {
                textures.push(config.depth_texture());
            }
            if textures.is_empty() {
                report
                    .warnings
                    .push(format!("framebuffer '{name}': no attachments requested"));
            }
            for texture in textures {
                if let Err(e) = texture.validate() {
                    problems.push(format!("framebuffer '{name}': {e}"));
                }
            }
        }

        for warning in &report.warnings {
            log::warn!("{warning}");
        }

        if problems.is_empty() {
            Ok(report)
        } else {
            Err(GlError::Manifest(problems.join("; ")))
        }
    }

    /// Builds every program. On failure, programs built so far are deleted.
    ///
    /// # Errors
    ///
    /// The first program error, prefixed with the program's name.
    #[allow(unsafe_code)]
    pub fn build_programs(
        &self,
        ctx: &GpuContext,
    ) -> Result<BTreeMap<String, glow::Program>, GlError> {
        use glow::HasContext;

        let mut built = BTreeMap::new();
        for (name, spec) in &self.programs {
            let result = match spec {
                ProgramSpec::Compute { compute } => {
                    ctx.compute_program(&self.base_dir.join(compute))
                }
                ProgramSpec::Graphics(stages) => ctx.program(&stages.resolved(&self.base_dir)),
            };
            match result {
                Ok(program) => {
                    built.insert(name.clone(), program);
                }
                Err(e) => {
                    // SAFETY: every program in `built` was just linked on this
                    // context and has not been handed out.
                    unsafe {
                        for program in built.into_values() {
                            ctx.gl().delete_program(program);
                        }
                    }
                    return Err(GlError::Manifest(format!("program '{name}': {e}")));
                }
            }
        }
        Ok(built)
    }

    /// Creates every framebuffer. On failure, framebuffers created so far
    /// are destroyed.
    ///
    /// # Errors
    ///
    /// The first framebuffer error, prefixed with the framebuffer's name.
    pub fn build_framebuffers(
        &self,
        ctx: &GpuContext,
    ) -> Result<BTreeMap<String, Framebuffer>, GlError> {
        let mut built = BTreeMap::new();
        for (name, config) in &self.framebuffers {
            match ctx.framebuffer(config) {
                Ok(framebuffer) => {
                    built.insert(name.clone(), framebuffer);
                }
                Err(e) => {
                    for framebuffer in built.into_values() {
                        framebuffer.destroy(ctx.gl());
                    }
                    return Err(GlError::Manifest(format!("framebuffer '{name}': {e}")));
                }
            }
        }
        Ok(built)
    }
}
