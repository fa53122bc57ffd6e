//! Wavefront OBJ loader.
//!
//! Parses OBJ text with `tobj` into a flat triangle list. Materials are
//! ignored; the demos bind their textures explicitly.

use std::io::Cursor;

use glam::{Vec2, Vec3};

use crate::errors::{Result, TavernError};
use crate::renderer::backend::VertexAttributes;
use crate::resources::geometry::{MeshData, Vertex};

/// Parses `bytes` as OBJ and scales every position by `scale`.
///
/// Missing normals are replaced with flat face normals. Tangents are computed
/// only when the file has texture coordinates.
pub fn parse_obj(path: &str, bytes: &[u8], scale: f32) -> Result<MeshData> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    };

    let mut reader = Cursor::new(bytes);
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(|e| TavernError::AssetParse {
                path: path.to_string(),
                message: e.to_string(),
            })?;

    let mut attributes = VertexAttributes::POSITION | VertexAttributes::UV | VertexAttributes::NORMAL;
    let mut vertices = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let has_uv = !mesh.texcoords.is_empty();
        let has_normal = !mesh.normals.is_empty();
        if !has_uv {
            attributes.remove(VertexAttributes::UV);
        }
        if !has_normal {
            attributes.remove(VertexAttributes::NORMAL);
        }

        vertices.reserve(mesh.indices.len());
        for &index in &mesh.indices {
            let i = index as usize;
            let position = Vec3::new(
                mesh.positions[3 * i],
                mesh.positions[3 * i + 1],
                mesh.positions[3 * i + 2],
            ) * scale;
            let uv = if has_uv {
                Vec2::new(mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1])
            } else {
                Vec2::ZERO
            };
            let normal = if has_normal {
                Vec3::new(
                    mesh.normals[3 * i],
                    mesh.normals[3 * i + 1],
                    mesh.normals[3 * i + 2],
                )
            } else {
                Vec3::ZERO
            };
            vertices.push(Vertex::new(position, uv, normal));
        }
    }

    if vertices.is_empty() {
        return Err(TavernError::AssetParse {
            path: path.to_string(),
            message: "no triangles".to_string(),
        });
    }

    let mut mesh = MeshData {
        vertices,
        attributes,
    };
    if !mesh.attributes.contains(VertexAttributes::NORMAL) {
        mesh.compute_flat_normals();
    }
    mesh.compute_tangents();
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn quad_is_triangulated_and_scaled() {
        let mesh = parse_obj("quad.obj", QUAD.as_bytes(), 2.0).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.vertices[1].position, [2.0, -2.0, 0.0]);
        assert!(mesh.attributes.contains(VertexAttributes::TANGENT));
    }

    #[test]
    fn missing_uvs_drop_tangents() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse_obj("tri.obj", src.as_bytes(), 1.0).unwrap();
        assert!(!mesh.attributes.contains(VertexAttributes::UV));
        assert!(!mesh.attributes.contains(VertexAttributes::TANGENT));
        // Flat normal of a CCW triangle in the XY plane.
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = parse_obj("empty.obj", b"# nothing\n", 1.0).unwrap_err();
        assert!(err.is_asset_error());
    }
}
