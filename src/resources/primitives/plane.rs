use glam::{Vec2, Vec3};

use crate::renderer::backend::VertexAttributes;
use crate::resources::geometry::{MeshData, Vertex};

/// A `size`-sided quad in the XY plane facing +Z, with tangents along +X.
#[must_use]
pub fn create_plane(size: f32) -> MeshData {
    let h = size / 2.0;
    let corner = |x: f32, y: f32, u: f32, v: f32| Vertex::new(Vec3::new(x, y, 0.0), Vec2::new(u, v), Vec3::Z);
    let vertices = vec![
        corner(-h, -h, 0.0, 0.0),
        corner(h, -h, 1.0, 0.0),
        corner(h, h, 1.0, 1.0),
        corner(-h, -h, 0.0, 0.0),
        corner(h, h, 1.0, 1.0),
        corner(-h, h, 0.0, 1.0),
    ];
    let mut mesh = MeshData {
        vertices,
        attributes: VertexAttributes::POSITION | VertexAttributes::UV | VertexAttributes::NORMAL,
    };
    mesh.compute_tangents();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_has_tangents_along_u() {
        let mesh = create_plane(2.0);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.attributes.contains(VertexAttributes::TANGENT));
        assert_eq!(mesh.vertices[0].tangent, [1.0, 0.0, 0.0]);
    }
}
