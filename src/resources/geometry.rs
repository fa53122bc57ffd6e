//! CPU-side mesh data.
//!
//! Meshes are flat, non-indexed triangle lists of interleaved [`Vertex`]
//! values matching [`VertexLayout::FULL`].

use glam::{Vec2, Vec3};

use crate::renderer::backend::{VertexAttributes, VertexLayout};

/// Interleaved vertex: `position, uv, normal, tangent`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == VertexLayout::FULL.stride as usize);

impl Vertex {
    #[must_use]
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            normal: normal.to_array(),
            tangent: [0.0; 3],
        }
    }
}

/// A triangle list ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Attributes that carry real data; the rest are zero-filled.
    pub attributes: VertexAttributes,
}

impl MeshData {
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[must_use]
    pub fn layout(&self) -> VertexLayout {
        VertexLayout::full_with(self.attributes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Computes one tangent per triangle from its UV gradient and assigns it
    /// to the triangle's three vertices. Requires UVs.
    pub fn compute_tangents(&mut self) {
        if !self.attributes.contains(VertexAttributes::UV) {
            return;
        }
        for tri in self.vertices.chunks_exact_mut(3) {
            let tangent = triangle_tangent(&tri[0], &tri[1], &tri[2]);
            for v in tri.iter_mut() {
                v.tangent = tangent.to_array();
            }
        }
        self.attributes |= VertexAttributes::TANGENT;
    }

    /// Replaces normals with flat face normals.
    pub fn compute_flat_normals(&mut self) {
        for tri in self.vertices.chunks_exact_mut(3) {
            let p0 = Vec3::from(tri[0].position);
            let p1 = Vec3::from(tri[1].position);
            let p2 = Vec3::from(tri[2].position);
            let n = (p1 - p0).cross(p2 - p0).normalize_or_zero();
            for v in tri.iter_mut() {
                v.normal = n.to_array();
            }
        }
        self.attributes |= VertexAttributes::NORMAL;
    }
}

/// Tangent of a textured triangle (direction of increasing `u`).
#[must_use]
pub fn triangle_tangent(a: &Vertex, b: &Vertex, c: &Vertex) -> Vec3 {
    let edge1 = Vec3::from(b.position) - Vec3::from(a.position);
    let edge2 = Vec3::from(c.position) - Vec3::from(a.position);
    let duv1 = Vec2::from(b.uv) - Vec2::from(a.uv);
    let duv2 = Vec2::from(c.uv) - Vec2::from(a.uv);

    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    if det.abs() < f32::EPSILON {
        return Vec3::X;
    }
    let f = 1.0 / det;
    (f * (duv2.y * edge1 - duv1.y * edge2)).normalize_or(Vec3::X)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_follows_u_axis() {
        let a = Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0), Vec3::Z);
        let b = Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 0.0), Vec3::Z);
        let c = Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 1.0), Vec3::Z);
        let t = triangle_tangent(&a, &b, &c);
        assert!((t - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn tangents_need_uvs() {
        let mut mesh = MeshData {
            vertices: vec![Vertex::default(); 3],
            attributes: VertexAttributes::POSITION,
        };
        mesh.compute_tangents();
        assert!(!mesh.attributes.contains(VertexAttributes::TANGENT));
    }
}
