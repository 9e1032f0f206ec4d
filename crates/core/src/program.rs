//! Program linking for graphics and compute pipelines.
//!
//! A graphics program always has a vertex and a fragment stage and may add
//! a geometry stage and a tessellation pair. Stage objects only live for the
//! duration of a build: they are released after linking whether the link
//! succeeded or not.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shader::{compile_shader, read_source, ShaderError};
use crate::stage::ShaderStage;

/// Source files for the stages of a graphics program.
///
/// Tessellation is enabled only when both the control and the evaluation
/// stage are given. A lone tessellation stage is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsStages {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tess_control: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tess_evaluation: Option<PathBuf>,
}

impl GraphicsStages {
    /// A plain vertex + fragment program.
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            geometry: None,
            tess_control: None,
            tess_evaluation: None,
        }
    }

    /// Adds a geometry stage.
    pub fn with_geometry(mut self, geometry: impl Into<PathBuf>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Adds a tessellation control + evaluation pair.
    pub fn with_tessellation(
        mut self,
        control: impl Into<PathBuf>,
        evaluation: impl Into<PathBuf>,
    ) -> Self {
        self.tess_control = Some(control.into());
        self.tess_evaluation = Some(evaluation.into());
        self
    }

    /// Whether both tessellation stages are present.
    pub fn uses_tessellation(&self) -> bool {
        self.tess_control.is_some() && self.tess_evaluation.is_some()
    }

    /// Whether exactly one tessellation stage is present (and will be ignored).
    pub fn has_partial_tessellation(&self) -> bool {
        self.tess_control.is_some() != self.tess_evaluation.is_some()
    }

    /// The stages that will be compiled, in attach order: vertex,
    /// tessellation control, tessellation evaluation, fragment, geometry.
    pub fn attach_plan(&self) -> Vec<(ShaderStage, &Path)> {
        let mut plan = vec![(ShaderStage::Vertex, self.vertex.as_path())];
        if let (Some(control), Some(evaluation)) = (&self.tess_control, &self.tess_evaluation) {
            plan.push((ShaderStage::TessControl, control.as_path()));
            plan.push((ShaderStage::TessEvaluation, evaluation.as_path()));
        }
        plan.push((ShaderStage::Fragment, self.fragment.as_path()));
        if let Some(geometry) = &self.geometry {
            plan.push((ShaderStage::Geometry, geometry.as_path()));
        }
        plan
    }

    /// Returns a copy with every relative path joined onto `base`.
    pub fn resolved(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| base.join(p);
        Self {
            vertex: join(&self.vertex),
            fragment: join(&self.fragment),
            geometry: self.geometry.as_ref().map(join),
            tess_control: self.tess_control.as_ref().map(join),
            tess_evaluation: self.tess_evaluation.as_ref().map(join),
        }
    }
}

/// Links already compiled shaders into a program.
///
/// Shaders are detached after linking; the caller still owns and must
/// delete them. The program is deleted if linking fails.
///
/// # Errors
///
/// Returns `ShaderError::Link` with the driver's info log if linking fails.
#[allow(unsafe_code)]
pub fn link_program(
    gl: &glow::Context,
    shaders: &[glow::Shader],
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    // SAFETY: glow wraps raw GL calls as unsafe. Every shader handle comes
    // from a successful compile_shader call; the program is deleted on failure.
    let program = unsafe { gl.create_program().map_err(ShaderError::Link)? };

    let linked = unsafe {
        for &shader in shaders {
            gl.attach_shader(program, shader);
        }
        gl.link_program(program);
        for &shader in shaders {
            gl.detach_shader(program, shader);
        }
        gl.get_program_link_status(program)
    };

    if linked {
        Ok(program)
    } else {
        let info_log = unsafe { gl.get_program_info_log(program) };
        unsafe { gl.delete_program(program) };
        Err(ShaderError::Link(
            info_log.trim_end_matches(['\0', '\n']).to_string(),
        ))
    }
}

/// Compiles every `(stage, source)` pair in order and links them.
///
/// All stage objects are deleted before returning, on success and on
/// every failure path.
///
/// # Errors
///
/// Returns the first `ShaderError::Compile`, or `ShaderError::Link`.
#[allow(unsafe_code)]
pub fn build_program(
    gl: &glow::Context,
    sources: &[(ShaderStage, &str)],
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let result = compile_link_release(
        sources,
        |stage, source| compile_shader(gl, stage, source),
        |shaders| link_program(gl, shaders),
        // SAFETY: every handle passed here is a live shader from
        // compile_shader. A linked program keeps its own copy of the binaries.
        |shader| unsafe { gl.delete_shader(shader) },
    );

    if result.is_ok() {
        let stages: Vec<&str> = sources.iter().map(|(stage, _)| stage.name()).collect();
        log::debug!("linked program from stages [{}]", stages.join(", "));
    }
    result
}

/// Compiles `sources` in order, links them, then releases every compiled
/// stage. Compilation stops at the first failure, in which case `link` is
/// never called; stages compiled before the failure are still released.
fn compile_link_release<S, P, E>(
    sources: &[(ShaderStage, &str)],
    mut compile: impl FnMut(ShaderStage, &str) -> Result<S, E>,
    link: impl FnOnce(&[S]) -> Result<P, E>,
    mut release: impl FnMut(S),
) -> Result<P, E> {
    let mut compiled = Vec::with_capacity(sources.len());
    let mut compiled_all = Ok(());
    for &(stage, source) in sources {
        match compile(stage, source) {
            Ok(shader) => compiled.push(shader),
            Err(e) => {
                compiled_all = Err(e);
                break;
            }
        }
    }

    let result = compiled_all.and_then(|()| link(&compiled));
    for shader in compiled {
        release(shader);
    }
    result
}

/// Reads the stage files of a graphics program, compiles and links them.
///
/// All files are read before any GL object is created, so a missing file
/// leaves no driver state behind.
///
/// # Errors
///
/// Returns `ShaderError::Source`, `ShaderError::Compile` or `ShaderError::Link`.
pub fn new_program(
    gl: &glow::Context,
    stages: &GraphicsStages,
) -> Result<glow::Program, ShaderError> {
    if stages.has_partial_tessellation() {
        log::warn!("ignoring tessellation stage: control and evaluation must both be given");
    }

    let plan = stages.attach_plan();
    let sources = plan
        .iter()
        .map(|&(stage, path)| read_source(path).map(|source| (stage, source)))
        .collect::<Result<Vec<_>, ShaderError>>()?;

    let borrowed: Vec<(ShaderStage, &str)> = sources
        .iter()
        .map(|(stage, source)| (*stage, source.as_str()))
        .collect();
    build_program(gl, &borrowed)
}

/// Reads, compiles and links a single compute stage.
///
/// # Errors
///
/// Returns `ShaderError::Source`, `ShaderError::Compile` or `ShaderError::Link`.
pub fn new_compute_program(
    gl: &glow::Context,
    path: &Path,
) -> Result<glow::Program, ShaderError> {
    let source = read_source(path)?;
    build_program(gl, &[(ShaderStage::Compute, source.as_str())])
}
