#![deny(unsafe_code)]
//! Thin OpenGL helpers built on `glow`.
//!
//! Covers the setup work around a GL context: compiling and linking shader
//! programs (graphics and compute), allocating textures and framebuffers,
//! loading image textures, and packing 2D point/index arrays into vertex
//! buffers. Every helper is a short synchronous sequence of driver calls;
//! the caller owns the returned handles and releases them explicitly.
//!
//! Driver-independent pieces (stage tables, texture validation, manifest
//! parsing, byte packing) are plain Rust and usable without a context.

pub mod context;
pub mod error;
pub mod framebuffer;
#[cfg(feature = "image")]
pub mod image_texture;
pub mod manifest;
pub mod mesh;
pub mod program;
pub mod shader;
pub mod stage;
pub mod texture;

pub use context::{Capabilities, GpuContext};
pub use error::GlError;
pub use framebuffer::{create_fbo_with_textures, Framebuffer, FramebufferConfig, FramebufferPreset};
#[cfg(feature = "image")]
pub use image_texture::{create_image_texture, load_rgba, ImageTexture};
pub use manifest::{Manifest, ProgramSpec, ValidationReport};
pub use mesh::MeshBuffer;
pub use program::{build_program, link_program, new_compute_program, new_program, GraphicsStages};
pub use shader::{annotate_source, compile_shader, read_source, ShaderError};
pub use stage::ShaderStage;
pub use texture::{create_texture, max_mip_levels, TextureConfig, WrapMode};
