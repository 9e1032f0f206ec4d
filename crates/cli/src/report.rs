//! Human-readable and JSON renderings of a checked manifest.

use std::fmt::Write as _;

use glforge_core::{Manifest, ShaderStage, TextureConfig, ValidationReport};
use serde_json::{json, Value};

/// Readable name for the internal formats the presets produce.
pub fn format_name(internal_format: u32) -> String {
    match internal_format {
        glow::RGBA8 => "RGBA8".into(),
        glow::RGBA32F => "RGBA32F".into(),
        glow::RG32F => "RG32F".into(),
        glow::DEPTH_COMPONENT32F => "DEPTH32F".into(),
        other => format!("0x{other:04X}"),
    }
}

fn texture_json(texture: &TextureConfig) -> Value {
    json!({
        "format": format_name(texture.internal_format),
        "mipmap_levels": texture.mipmap_levels,
        "samples": texture.samples,
    })
}

/// Programs with their attach plans and framebuffers with their attachment
/// formats, plus validation warnings.
pub fn manifest_json(manifest: &Manifest, report: &ValidationReport) -> Value {
    let programs: Vec<Value> = manifest
        .programs
        .keys()
        .map(|name| {
            let stages: Vec<Value> = manifest
                .program_stages(name)
                .unwrap_or_default()
                .into_iter()
                .map(|(stage, path)| json!({ "stage": stage, "path": path.display().to_string() }))
                .collect();
            json!({ "name": name, "stages": stages })
        })
        .collect();

    let framebuffers: Vec<Value> = manifest
        .framebuffers
        .iter()
        .map(|(name, config)| {
            json!({
                "name": name,
                "width": config.width,
                "height": config.height,
                "preset": config.preset,
                "color": config.color.then(|| texture_json(&config.color_texture())),
                "depth": config.depth.then(|| texture_json(&config.depth_texture())),
            })
        })
        .collect();

    json!({
        "programs": programs,
        "framebuffers": framebuffers,
        "warnings": report.warnings,
    })
}

/// Plain-text version of [`manifest_json`].
pub fn manifest_text(manifest: &Manifest, report: &ValidationReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Programs:");
    for name in manifest.programs.keys() {
        let stages = manifest.program_stages(name).unwrap_or_default();
        let names: Vec<&str> = stages.iter().map(|(stage, _)| stage.name()).collect();
        let _ = writeln!(out, "  {name}: {}", names.join(" -> "));
    }

    let _ = writeln!(out, "Framebuffers:");
    for (name, config) in &manifest.framebuffers {
        let mut attachments = Vec::new();
        if config.color {
            attachments.push(format!(
                "color {}",
                format_name(config.color_texture().internal_format)
            ));
        }
        if config.depth {
            attachments.push(format!(
                "depth {}",
                format_name(config.depth_texture().internal_format)
            ));
        }
        let samples = config
            .samples
            .map(|s| format!(", {s}x MSAA"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {name}: {}x{}{samples} [{}]",
            config.width,
            config.height,
            attachments.join(", ")
        );
    }

    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

/// Stage names with their conventional file extensions.
pub fn stage_json() -> Value {
    let stages: Vec<Value> = ShaderStage::all()
        .into_iter()
        .map(|stage| json!({ "stage": stage, "extension": stage.extension() }))
        .collect();
    Value::Array(stages)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "programs": {
            "scene": { "vertex": "s.vert", "fragment": "s.frag" },
            "sim": { "compute": "sim.comp" }
        },
        "framebuffers": {
            "main": { "width": 640, "height": 480, "samples": 4, "floating_point": true },
            "light": { "width": 256, "height": 256, "preset": "light", "depth": false }
        }
    }"#;

    fn manifest() -> Manifest {
        Manifest::from_json_str(MANIFEST, "assets").unwrap()
    }

    #[test]
    fn format_name_covers_preset_formats() {
        assert_eq!(format_name(glow::RGBA8), "RGBA8");
        assert_eq!(format_name(glow::RG32F), "RG32F");
        assert_eq!(format_name(glow::DEPTH_COMPONENT32F), "DEPTH32F");
        assert_eq!(format_name(0x1234), "0x1234");
    }

    #[test]
    fn manifest_json_lists_stages_in_attach_order() {
        let value = manifest_json(&manifest(), &ValidationReport::default());
        let scene = value["programs"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == "scene")
            .unwrap();
        assert_eq!(scene["stages"][0]["stage"], "vertex");
        assert_eq!(scene["stages"][1]["stage"], "fragment");
    }

    #[test]
    fn manifest_json_omits_unrequested_attachments() {
        let value = manifest_json(&manifest(), &ValidationReport::default());
        let light = value["framebuffers"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "light")
            .unwrap();
        assert_eq!(light["color"]["format"], "RG32F");
        assert!(light["depth"].is_null());
    }

    #[test]
    fn manifest_text_shows_msaa_and_formats() {
        let text = manifest_text(&manifest(), &ValidationReport::default());
        assert!(text.contains("sim: compute"), "got:\n{text}");
        assert!(text.contains("scene: vertex -> fragment"), "got:\n{text}");
        assert!(
            text.contains("main: 640x480, 4x MSAA [color RGBA32F, depth DEPTH32F]"),
            "got:\n{text}"
        );
    }

    #[test]
    fn manifest_text_appends_warnings() {
        let report = ValidationReport {
            warnings: vec!["something odd".into()],
        };
        let text = manifest_text(&manifest(), &report);
        assert!(text.ends_with("warning: something odd\n"), "got:\n{text}");
    }

    #[test]
    fn stage_json_has_one_entry_per_stage() {
        let value = stage_json();
        let stages = value.as_array().unwrap();
        assert_eq!(stages.len(), 6);
        assert_eq!(stages[0]["extension"], "vert");
        assert_eq!(stages[5]["stage"], "compute");
    }
}
