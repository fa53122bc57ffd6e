use glam::{Vec2, Vec3};

use crate::renderer::backend::VertexAttributes;
use crate::resources::geometry::{MeshData, Vertex};

/// An axis-aligned box centered on the origin as 36 unindexed vertices,
/// counter-clockwise when seen from outside.
#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> MeshData {
    let half = Vec3::new(width, height, depth) / 2.0;

    // (normal, u axis, v axis) per face; u × v = normal.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        for uv in corners {
            let local = normal + u * (uv.x * 2.0 - 1.0) + v * (uv.y * 2.0 - 1.0);
            vertices.push(Vertex::new(local * half, uv, normal));
        }
    }

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
    fn faces_wind_outwards() {
        let mesh = create_box(2.0, 2.0, 2.0);
        assert_eq!(mesh.vertex_count(), 36);
        for tri in mesh.vertices.chunks_exact(3) {
            let p: Vec<Vec3> = tri.iter().map(|v| Vec3::from(v.position)).collect();
            let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
            assert!((face_normal - Vec3::from(tri[0].normal)).length() < 1e-5);
        }
    }
}
