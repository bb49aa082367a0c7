//! CPU-side geometry shared with the GL backend.

use bytemuck::{Pod, Zeroable};

/// A vertex of a tessellated mesh, ready for the GPU.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 2],
}

/// An indexed triangle mesh.
///
/// Every quad the splash draws (background, logos) is this mesh spanning
/// `[0,1]x[0,1]`, scaled and offset in the vertex shader.
#[derive(Clone, Debug)]
pub struct QuadMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}
