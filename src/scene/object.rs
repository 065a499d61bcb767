use crate::assets::obj::ObjMesh;
use crate::assets::LoadSource;
use glam::{Mat4, Vec3};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

/// Reference to a material owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unique triangle edges as a line list, for wireframe drawing.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                if seen.insert((a.min(b), a.max(b))) {
                    edges.push(a);
                    edges.push(b);
                }
            }
        }
        edges
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub geometry: MeshGeometry,
    pub material: MaterialHandle,
    /// Material named by the file; never used for drawing.
    pub requested_material: Option<String>,
}

impl SceneMesh {
    pub(crate) fn from_obj(mesh: ObjMesh, material: MaterialHandle) -> Self {
        Self {
            name: mesh.name,
            geometry: MeshGeometry {
                positions: mesh.positions,
                normals: mesh.normals,
                indices: mesh.indices,
            },
            material,
            requested_material: mesh.material,
        }
    }
}

/// The model currently shown. Replaced as a whole on every load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedObject {
    pub id: ObjectId,
    pub name: String,
    pub source: LoadSource,
    pub digest: String,
    pub meshes: Vec<SceneMesh>,
    pub visible: bool,
    pub scale: Vec3,
    pub bounds: Option<([f32; 3], [f32; 3])>,
}

impl LoadedObject {
    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.positions.len())
            .sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.triangle_count())
            .sum()
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vec3::splat(scale);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }
}
