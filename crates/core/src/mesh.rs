//! Vertex and index buffers for flat 2D geometry.
//!
//! Points are uploaded as tightly packed `Vec2`s and exposed to shaders as
//! vertex attribute 0 (two floats). Line meshes add a `u32` element buffer
//! recorded in the vertex array. Input too small to draw yields an empty
//! mesh that owns no GL objects.

use glam::Vec2;

use crate::error::GlError;

/// Attribute location the 2D position is bound to.
pub const POSITION_ATTRIBUTE: u32 = 0;

/// Byte distance between consecutive points.
pub const VERTEX_STRIDE: i32 = std::mem::size_of::<Vec2>() as i32;

/// Minimum number of points for a triangle mesh.
pub const MIN_TRIANGLE_POINTS: usize = 3;

/// Minimum number of points (and indices) for a line mesh.
pub const MIN_LINE_POINTS: usize = 2;

/// Points as raw bytes, in upload layout.
pub fn vertex_bytes(points: &[Vec2]) -> &[u8] {
    bytemuck::cast_slice(points)
}

/// Indices as raw bytes, in upload layout.
pub fn index_bytes(indices: &[u32]) -> &[u8] {
    bytemuck::cast_slice(indices)
}

/// Whether `points` points are enough for a triangle mesh.
pub fn triangles_drawable(points: usize) -> bool {
    points >= MIN_TRIANGLE_POINTS
}

/// Whether `points` points and `indices` indices are enough for a line mesh.
pub fn lines_drawable(points: usize, indices: usize) -> bool {
    points >= MIN_LINE_POINTS && indices >= MIN_LINE_POINTS
}

fn gl_count(what: &'static str, count: usize) -> Result<i32, GlError> {
    i32::try_from(count).map_err(|_| GlError::CountOverflow { what, count })
}

/// GPU buffers for a 2D mesh plus the counts needed to draw it.
#[derive(Debug, Default)]
pub struct MeshBuffer {
    vao: Option<glow::VertexArray>,
    vbo: Option<glow::Buffer>,
    vertex_count: i32,
    ebo: Option<glow::Buffer>,
    index_count: i32,
}

impl MeshBuffer {
    /// Uploads a triangle list.
    ///
    /// Fewer than three points returns an empty mesh without touching the
    /// driver.
    ///
    /// # Errors
    ///
    /// `GlError::CountOverflow` for more points than the driver can count,
    /// `GlError::Driver` if a buffer or vertex array cannot be created.
    pub fn from_triangles_2d(gl: &glow::Context, points: &[Vec2]) -> Result<Self, GlError> {
        if !triangles_drawable(points.len()) {
            log::debug!("skipping triangle mesh with {} points", points.len());
            return Ok(Self::default());
        }
        let mut mesh = Self::default();
        if let Err(e) = mesh.upload(gl, points, None) {
            mesh.free(gl);
            return Err(e);
        }
        Ok(mesh)
    }

    /// Uploads an indexed line list.
    ///
    /// Fewer than two points or two indices returns an empty mesh without
    /// touching the driver.
    ///
    /// # Errors
    ///
    /// As [`MeshBuffer::from_triangles_2d`].
    pub fn from_lines_2d(
        gl: &glow::Context,
        points: &[Vec2],
        indices: &[u32],
    ) -> Result<Self, GlError> {
        if !lines_drawable(points.len(), indices.len()) {
            log::debug!(
                "skipping line mesh with {} points and {} indices",
                points.len(),
                indices.len()
            );
            return Ok(Self::default());
        }
        let mut mesh = Self::default();
        if let Err(e) = mesh.upload(gl, points, Some(indices)) {
            mesh.free(gl);
            return Err(e);
        }
        Ok(mesh)
    }

    /// Creates every GL object, recording handles as soon as they exist so
    /// that `free` can release a partially built mesh.
    #[allow(unsafe_code)]
    fn upload(
        &mut self,
        gl: &glow::Context,
        points: &[Vec2],
        indices: Option<&[u32]>,
    ) -> Result<(), GlError> {
        use glow::HasContext;

        let vertex_count = gl_count("vertex", points.len())?;
        let index_count = indices
            .map(|indices| gl_count("index", indices.len()))
            .transpose()?;

        // SAFETY: glow wraps raw GL calls as unsafe. Uploaded slices are
        // plain `f32`/`u32` data whose layout matches the attribute pointer.
        unsafe {
            let vbo = gl.create_buffer().map_err(GlError::Driver)?;
            self.vbo = Some(vbo);
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertex_bytes(points), glow::STATIC_DRAW);

            let vao = gl.create_vertex_array().map_err(GlError::Driver)?;
            self.vao = Some(vao);
            gl.bind_vertex_array(Some(vao));
            gl.enable_vertex_attrib_array(POSITION_ATTRIBUTE);
            gl.vertex_attrib_pointer_f32(POSITION_ATTRIBUTE, 2, glow::FLOAT, false, VERTEX_STRIDE, 0);

            if let Some(indices) = indices {
                let ebo = gl.create_buffer().map_err(GlError::Driver)?;
                self.ebo = Some(ebo);
                // Bound while the vertex array is bound so the array records it.
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                gl.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    index_bytes(indices),
                    glow::STATIC_DRAW,
                );
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }

        self.vertex_count = vertex_count;
        self.index_count = index_count.unwrap_or(0);
        log::debug!(
            "uploaded mesh: {} vertices, {} indices",
            self.vertex_count,
            self.index_count
        );
        Ok(())
    }

    /// The vertex array to bind before drawing.
    pub fn vertex_array(&self) -> Option<glow::VertexArray> {
        self.vao
    }

    pub fn vertex_buffer(&self) -> Option<glow::Buffer> {
        self.vbo
    }

    pub fn index_buffer(&self) -> Option<glow::Buffer> {
        self.ebo
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> i32 {
        self.index_count
    }

    /// True when the mesh owns no GL objects.
    pub fn is_empty(&self) -> bool {
        self.vao.is_none() && self.vbo.is_none() && self.ebo.is_none()
    }

    /// Deletes every buffer and the vertex array, then zeroes the counts.
    ///
    /// Safe to call more than once; later calls do nothing.
    #[allow(unsafe_code)]
    pub fn free(&mut self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: each handle is taken out of `self` before deletion, so no
        // handle is deleted twice.
        unsafe {
            if let Some(vao) = self.vao.take() {
                gl.delete_vertex_array(vao);
            }
            if let Some(vbo) = self.vbo.take() {
                gl.delete_buffer(vbo);
            }
            if let Some(ebo) = self.ebo.take() {
                gl.delete_buffer(ebo);
            }
        }
        self.vertex_count = 0;
        self.index_count = 0;
    }
}
