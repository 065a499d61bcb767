//! Plain-data GPU layouts and the CPU side of filling them.

use super::camera::OrbitCamera;
use crate::scene::{HelperVertex, LoadedObject, MeshGeometry, ObjectId, Scene};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    /// Linear RGB plus opacity.
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame uniform block shared by the mesh and line shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Unit vector towards the light.
    pub light_direction: [f32; 4],
    /// Linear color premultiplied by intensity.
    pub light_color: [f32; 4],
    pub ambient_color: [f32; 4],
    pub diffuse: [f32; 4],
    /// Linear color in xyz, shininess in w.
    pub specular: [f32; 4],
    /// x: 1 when the shader must encode sRGB itself. y: 1 when back faces are lit.
    pub options: [f32; 4],
}

impl FrameUniforms {
    pub fn new(scene: &Scene, camera: &OrbitCamera, encode_srgb: bool) -> Self {
        let light = &scene.directional_light;
        let material = scene.material();
        let model = scene
            .object()
            .map(LoadedObject::model_matrix)
            .unwrap_or(Mat4::IDENTITY);
        let light_rgb = light.color.to_linear();
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_position: camera.eye().extend(1.0).to_array(),
            light_direction: light.to_light().extend(0.0).to_array(),
            light_color: [
                light_rgb[0] * light.intensity,
                light_rgb[1] * light.intensity,
                light_rgb[2] * light.intensity,
                1.0,
            ],
            ambient_color: with_w(scene.ambient_light.color.to_linear(), 1.0),
            diffuse: with_w(material.diffuse.to_linear(), 1.0),
            specular: with_w(material.specular.to_linear(), material.shininess),
            options: [
                flag(encode_srgb),
                flag(material.double_sided),
                0.0,
                0.0,
            ],
        }
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn with_w(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}

pub fn mesh_vertices(geometry: &MeshGeometry) -> Vec<MeshVertex> {
    geometry
        .positions
        .iter()
        .zip(&geometry.normals)
        .map(|(&position, &normal)| MeshVertex { position, normal })
        .collect()
}

pub fn line_vertices(vertices: &[HelperVertex], opacity: f32) -> Vec<LineVertex> {
    vertices
        .iter()
        .map(|(position, color)| LineVertex {
            position: *position,
            color: with_w(color.to_linear(), opacity),
        })
        .collect()
}

pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    edge_buffer: wgpu::Buffer,
    edge_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, name: &str, geometry: &MeshGeometry) -> Self {
        let vertices = mesh_vertices(geometry);
        let edges = geometry.edge_indices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} vertices")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} triangles")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} edges")),
            contents: bytemuck::cast_slice(&edges),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            edge_buffer,
            edge_count: edges.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, wireframe: bool) {
        let (buffer, count) = if wireframe {
            (&self.edge_buffer, self.edge_count)
        } else {
            (&self.index_buffer, self.index_count)
        };
        if count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..count, 0, 0..1);
    }
}

/// GPU copy of the loaded object, keyed by its id.
pub struct GpuObject {
    pub id: ObjectId,
    pub meshes: Vec<GpuMesh>,
}

impl GpuObject {
    pub fn upload(device: &wgpu::Device, object: &LoadedObject) -> Self {
        let meshes = object
            .meshes
            .iter()
            .map(|mesh| GpuMesh::upload(device, &mesh.name, &mesh.geometry))
            .collect();
        log::debug!("Uploaded '{}' ({} meshes)", object.name, object.meshes.len());
        Self {
            id: object.id,
            meshes,
        }
    }
}

pub struct LineBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl LineBuffer {
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[LineVertex]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            count: vertices.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(0..self.count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::params::{Rgb, ViewerState};

    #[test]
    fn uniform_block_is_std140_sized() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 2 * 64 + 7 * 16);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
    }

    #[test]
    fn uniforms_follow_scene_values() {
        let mut state = ViewerState::default();
        state.intensity = 2.0;
        state.light_color = Rgb::WHITE;
        state.shininess = 12.0;
        let scene = Scene::build(&state);
        let camera = OrbitCamera::new(&CameraConfig::default(), 1.0);

        let uniforms = FrameUniforms::new(&scene, &camera, true);
        assert!(uniforms.light_color[..3]
            .iter()
            .all(|channel| (channel - 2.0).abs() < 1e-4));
        assert_eq!(uniforms.light_direction, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniforms.specular[3], 12.0);
        assert_eq!(uniforms.options[0], 1.0);
        assert_eq!(uniforms.options[1], 1.0);
        assert_eq!(uniforms.model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn helper_lines_carry_opacity() {
        let scene = Scene::build(&ViewerState::default());
        let lines = line_vertices(&scene.grid.line_vertices(), scene.grid.opacity);
        assert!(lines.iter().all(|vertex| vertex.color[3] == 0.25));
    }

    #[test]
    fn mesh_vertices_pair_positions_with_normals() {
        let geometry = MeshGeometry {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            normals: vec![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            indices: Vec::new(),
        };
        let vertices = mesh_vertices(&geometry);
        assert_eq!(vertices[1].position, [4.0, 5.0, 6.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
    }
}
