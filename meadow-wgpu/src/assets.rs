//! Mesh preparation for loader output: tangent-space generation with a
//! non-fatal fallback when the required attributes are missing.

use std::fmt;

use glam::Vec3;

/// CPU-side mesh attributes handed over by the loader collaborator.
/// `tangents` may be empty; [`prepare_mesh`] fills it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

/// Why tangent generation was skipped for a mesh. Recoverable: the object
/// is still placed, its normal-mapping quality degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TangentError {
    MissingAttribute(&'static str),
    AttributeCountMismatch,
}

impl fmt::Display for TangentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute(name) => write!(f, "missing {name} attribute"),
            Self::AttributeCountMismatch => write!(f, "attribute streams have mismatched lengths"),
        }
    }
}

impl std::error::Error for TangentError {}

/// Tangent frame used when generation is skipped: +X with positive
/// handedness.
pub const DEFAULT_TANGENT: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Per-vertex tangents from triangle UV gradients, averaged and
/// Gram-Schmidt orthogonalized against the vertex normal. Handedness goes
/// into the w component.
pub fn compute_tangents(mesh: &MeshData) -> Result<Vec<[f32; 4]>, TangentError> {
    if mesh.positions.is_empty() {
        return Err(TangentError::MissingAttribute("position"));
    }
    if mesh.normals.is_empty() {
        return Err(TangentError::MissingAttribute("normal"));
    }
    if mesh.uvs.is_empty() {
        return Err(TangentError::MissingAttribute("uv"));
    }
    if mesh.normals.len() != mesh.positions.len() || mesh.uvs.len() != mesh.positions.len() {
        return Err(TangentError::AttributeCountMismatch);
    }

    let count = mesh.positions.len();
    let mut tan_acc = vec![Vec3::ZERO; count];
    let mut bitan_acc = vec![Vec3::ZERO; count];

    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= count || i1 >= count || i2 >= count {
            continue;
        }
        let p0 = Vec3::from(mesh.positions[i0]);
        let p1 = Vec3::from(mesh.positions[i1]);
        let p2 = Vec3::from(mesh.positions[i2]);
        let e1 = p1 - p0;
        let e2 = p2 - p0;

        let duv1x = mesh.uvs[i1][0] - mesh.uvs[i0][0];
        let duv1y = mesh.uvs[i1][1] - mesh.uvs[i0][1];
        let duv2x = mesh.uvs[i2][0] - mesh.uvs[i0][0];
        let duv2y = mesh.uvs[i2][1] - mesh.uvs[i0][1];

        let det = duv1x * duv2y - duv2x * duv1y;
        if det.abs() < 1e-8 {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * duv2y - e2 * duv1y) * r;
        let bitangent = (e2 * duv1x - e1 * duv2x) * r;

        for &i in &[i0, i1, i2] {
            tan_acc[i] += tangent;
            bitan_acc[i] += bitangent;
        }
    }

    let mut tangents = Vec::with_capacity(count);
    for i in 0..count {
        let n = Vec3::from(mesh.normals[i]);
        let t = tan_acc[i] - n * n.dot(tan_acc[i]);
        if t.length_squared() < 1e-12 {
            tangents.push(DEFAULT_TANGENT);
            continue;
        }
        let t = t.normalize();
        let w = if n.cross(t).dot(bitan_acc[i]) < 0.0 {
            -1.0
        } else {
            1.0
        };
        tangents.push([t.x, t.y, t.z, w]);
    }
    Ok(tangents)
}

/// Fill the tangent stream of a freshly loaded mesh. The scene-assembly
/// collaborator calls this on loader completion and always gets a placeable
/// mesh back: a failed tangent computation degrades to the default frame
/// with a warning instead of aborting placement.
pub fn prepare_mesh(mut mesh: MeshData, label: &str) -> MeshData {
    if !mesh.tangents.is_empty() && mesh.tangents.len() == mesh.positions.len() {
        return mesh;
    }
    match compute_tangents(&mesh) {
        Ok(tangents) => mesh.tangents = tangents,
        Err(err) => {
            log::warn!("{label}: {err}; placing with the default tangent frame");
            mesh.tangents = vec![DEFAULT_TANGENT; mesh.positions.len()];
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> MeshData {
        MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            tangents: Vec::new(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn test_quad_tangents_follow_u_axis() {
        let tangents = compute_tangents(&unit_quad()).unwrap();
        assert_eq!(tangents.len(), 4);
        for t in tangents {
            assert!((t[0] - 1.0).abs() < 1e-5);
            assert!(t[1].abs() < 1e-5);
            assert!(t[2].abs() < 1e-5);
            assert_eq!(t[3], 1.0);
        }
    }

    #[test]
    fn test_missing_uv_is_recoverable() {
        let mut mesh = unit_quad();
        mesh.uvs.clear();
        assert_eq!(
            compute_tangents(&mesh),
            Err(TangentError::MissingAttribute("uv"))
        );

        let prepared = prepare_mesh(mesh, "test-quad");
        assert_eq!(prepared.tangents, vec![DEFAULT_TANGENT; 4]);
        assert_eq!(prepared.positions.len(), 4);
    }

    #[test]
    fn test_existing_tangents_kept() {
        let mut mesh = unit_quad();
        mesh.tangents = vec![[0.0, 1.0, 0.0, -1.0]; 4];
        let prepared = prepare_mesh(mesh.clone(), "test-quad");
        assert_eq!(prepared.tangents, mesh.tangents);
    }

    #[test]
    fn test_degenerate_uv_falls_back_per_vertex() {
        let mut mesh = unit_quad();
        mesh.uvs = vec![[0.5, 0.5]; 4];
        let tangents = compute_tangents(&mesh).unwrap();
        assert_eq!(tangents, vec![DEFAULT_TANGENT; 4]);
    }
}
