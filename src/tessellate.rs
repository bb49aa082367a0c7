//! Mesh generation via lyon.

use lyon::math::point;
use lyon::path::Path as LyonPath;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};

use crate::types::{QuadMesh, Vertex};

/// The unit rectangle `[0,1]x[0,1]` as a triangle mesh.
///
/// Returns `None` if tessellation fails, which would indicate a lyon bug.
#[must_use]
pub fn unit_rectangle() -> Option<QuadMesh> {
    let mut builder = LyonPath::builder();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(1.0, 0.0));
    builder.line_to(point(1.0, 1.0));
    builder.line_to(point(0.0, 1.0));
    builder.close();
    tessellate_path(&builder.build())
}

/// Tessellate a lyon path into an indexed triangle mesh.
fn tessellate_path(path: &LyonPath) -> Option<QuadMesh> {
    let mut geometry: VertexBuffers<Vertex, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();

    let result = tessellator.tessellate_path(
        path,
        &FillOptions::tolerance(0.01).with_fill_rule(FillRule::NonZero),
        &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| Vertex {
            position: vertex.position().to_array(),
        }),
    );

    if result.is_err() || geometry.vertices.is_empty() {
        return None;
    }
    Some(QuadMesh {
        vertices: geometry.vertices,
        indices: geometry.indices,
    })
}
