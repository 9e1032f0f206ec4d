//! Shader stage compilation.
//!
//! `compile_shader` turns one GLSL source string into a driver-side shader
//! object. On failure the driver's info log is returned together with the
//! line-numbered source so the log's `0:LINE` references can be read
//! without opening the file. `annotate_source` is pure string processing
//! and is usable without a GL context.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::stage::ShaderStage;

/// Errors that can occur while loading, compiling or linking shaders.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A stage source file could not be read.
    #[error("cannot read shader source {}: {reason}", path.display())]
    Source {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying I/O error message.
        reason: String,
    },
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    Compile {
        /// The stage that failed.
        stage: ShaderStage,
        /// Numbered source followed by the driver's info log.
        log: String,
    },
    /// A program failed to link.
    #[error("shader link error:\n{0}")]
    Link(String),
}

/// Prefixes every line of `source` with its 1-based, right-aligned line
/// number and appends the driver `log` after a blank line.
///
/// Either input may be empty; an empty source yields just the log and an
/// empty log yields just the numbered source.
pub fn annotate_source(source: &str, log: &str) -> String {
    let line_count = source.lines().count();
    let width = line_count.max(1).to_string().len();

    let numbered = source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    let log = log.trim_end_matches(['\0', '\n']);
    match (numbered.is_empty(), log.is_empty()) {
        (true, _) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

/// Reads a shader source file into a string.
///
/// # Errors
///
/// Returns `ShaderError::Source` if the file cannot be opened or is not UTF-8.
pub fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|e| ShaderError::Source {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Compiles a single shader stage.
///
/// The shader object is deleted before returning on every failure path,
/// so the caller only ever owns successfully compiled shaders.
///
/// # Errors
///
/// Returns `ShaderError::Compile` if the driver refuses to create the
/// shader object or the GLSL source fails to compile.
#[allow(unsafe_code)]
pub fn compile_shader(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    // SAFETY: glow wraps raw GL calls as unsafe. `stage.gl_enum()` is always
    // a valid shader type and the shader handle is deleted on failure.
    let shader = unsafe {
        gl.create_shader(stage.gl_enum())
            .map_err(|log| ShaderError::Compile { stage, log })?
    };

    let compiled = unsafe {
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        gl.get_shader_compile_status(shader)
    };

    if compiled {
        log::debug!("compiled {stage} shader ({} lines)", source.lines().count());
        Ok(shader)
    } else {
        let info_log = unsafe { gl.get_shader_info_log(shader) };
        unsafe { gl.delete_shader(shader) };
        Err(ShaderError::Compile {
            stage,
            log: annotate_source(source, &info_log),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_source_numbers_each_line_and_appends_log() {
        let source = "#version 450\nvoid main() {\n}\n";
        let log = "ERROR: 0:2: syntax error";
        let out = annotate_source(source, log);

        assert!(out.contains("1: #version 450"), "got:\n{out}");
        assert!(out.contains("2: void main() {"), "got:\n{out}");
        assert!(out.contains("3: }"), "got:\n{out}");
        assert!(out.ends_with(log), "log should come last, got:\n{out}");
    }

    #[test]
    fn annotate_source_separates_source_and_log_with_blank_line() {
        let out = annotate_source("a\nb", "bad");
        assert_eq!(out, "1: a\n2: b\n\nbad");
    }

    #[test]
    fn annotate_source_right_aligns_numbers() {
        let source = (1..=12)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let out = annotate_source(&source, "");
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with(" 1: "), "got: '{}'", lines[0]);
        assert!(lines[11].starts_with("12: "), "got: '{}'", lines[11]);
    }

    #[test]
    fn annotate_source_with_empty_source_returns_log() {
        assert_eq!(annotate_source("", "some error"), "some error");
    }

    #[test]
    fn annotate_source_with_both_empty_is_empty() {
        assert!(annotate_source("", "").is_empty());
    }

    #[test]
    fn annotate_source_strips_trailing_nul_from_log() {
        let out = annotate_source("x", "oops\n\0");
        assert!(out.ends_with("oops"), "got: {out:?}");
    }

    #[test]
    fn read_source_reports_missing_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.frag");
        let err = read_source(&path).unwrap_err();
        assert!(matches!(err, ShaderError::Source { .. }));
        assert!(err.to_string().contains("missing.frag"), "got: {err}");
    }

    #[test]
    fn read_source_returns_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pass.vert");
        std::fs::write(&path, "void main() {}\n").unwrap();
        assert_eq!(read_source(&path).unwrap(), "void main() {}\n");
    }

    #[test]
    fn compile_error_display_includes_stage_and_log() {
        let err = ShaderError::Compile {
            stage: ShaderStage::Geometry,
            log: "undeclared identifier".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("geometry"), "missing stage in: {msg}");
        assert!(msg.contains("undeclared identifier"), "missing log in: {msg}");
    }

    #[test]
    fn shader_error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ShaderError>();
    }

    #[test]
    #[ignore = "requires GL context"]
    fn compile_shader_rejects_invalid_glsl() {
        // Would test: compile_shader(gl, Fragment, "not glsl") returns
        // ShaderError::Compile whose log carries the numbered source.
    }
}
