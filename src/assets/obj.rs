//! Wavefront OBJ decoding.
//!
//! Supported: `v`, `vn`, `vt` (read and discarded), `f` with any of the
//! `v`, `v/t`, `v//n`, `v/t/n` forms and negative indices, `o`/`g` and
//! `usemtl` mesh splits. Polygons are fan-triangulated. Other statements
//! (`mtllib`, `s`, `l`, `p`, ...) are skipped.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjError {
    #[error("line {line}: invalid number {token:?}")]
    BadNumber { line: usize, token: String },
    #[error("line {line}: '{keyword}' needs {expected} components")]
    MissingComponent {
        line: usize,
        keyword: String,
        expected: usize,
    },
    #[error("line {line}: malformed face vertex {token:?}")]
    BadFaceVertex { line: usize, token: String },
    #[error("line {line}: index {index} out of range ({count} defined)")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        count: usize,
    },
    #[error("line {line}: face needs at least 3 vertices")]
    DegenerateFace { line: usize },
    #[error("no faces found")]
    NoGeometry,
}

/// One drawable group of triangles with its own indexed vertex set.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjMesh {
    pub name: String,
    /// Material the file asked for with `usemtl`; kept for display only.
    pub material: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl ObjMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjModel {
    pub meshes: Vec<ObjMesh>,
}

impl ObjModel {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(ObjMesh::triangle_count).sum()
    }

    /// Axis-aligned (min, max) over every mesh vertex.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut positions = self.meshes.iter().flat_map(|mesh| mesh.positions.iter());
        let first = *positions.next()?;
        Some(positions.fold((first, first), |(mut min, mut max), p| {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
            (min, max)
        }))
    }
}

pub fn parse(text: &str) -> Result<ObjModel, ObjError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut meshes = Vec::new();
    let mut current = MeshBuilder::new("default".to_string(), None);

    for (line_index, raw) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();

        match keyword {
            "v" => positions.push(parse_vec3(line_no, keyword, &args)?),
            "vn" => normals.push(parse_vec3(line_no, keyword, &args)?),
            "vt" => {
                if args.is_empty() {
                    return Err(missing(line_no, keyword, 1));
                }
                for token in &args {
                    parse_float(line_no, token)?;
                }
            }
            "f" => {
                if args.len() < 3 {
                    return Err(ObjError::DegenerateFace { line: line_no });
                }
                let mut corners = Vec::with_capacity(args.len());
                for token in &args {
                    corners.push(parse_face_vertex(
                        line_no,
                        token,
                        positions.len(),
                        normals.len(),
                    )?);
                }
                for i in 1..corners.len() - 1 {
                    for corner in [corners[0], corners[i], corners[i + 1]] {
                        current.push_corner(corner, &positions, &normals);
                    }
                }
            }
            "o" | "g" => {
                let name = if args.is_empty() {
                    current.name.clone()
                } else {
                    args.join(" ")
                };
                let material = current.material.clone();
                let finished = std::mem::replace(&mut current, MeshBuilder::new(name, material));
                meshes.extend(finished.finish());
            }
            "usemtl" => {
                let material = args.first().map(|name| name.to_string());
                if current.has_faces() {
                    let name = current.name.clone();
                    let finished =
                        std::mem::replace(&mut current, MeshBuilder::new(name, material));
                    meshes.extend(finished.finish());
                } else {
                    current.material = material;
                }
            }
            other => log::debug!("obj line {}: skipping '{}'", line_no, other),
        }
    }
    meshes.extend(current.finish());

    if meshes.is_empty() {
        return Err(ObjError::NoGeometry);
    }
    Ok(ObjModel { meshes })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

struct MeshBuilder {
    name: String,
    material: Option<String>,
    positions: Vec<[f32; 3]>,
    normals: Vec<Option<[f32; 3]>>,
    indices: Vec<u32>,
    lookup: HashMap<Corner, u32>,
}

impl MeshBuilder {
    fn new(name: String, material: Option<String>) -> Self {
        Self {
            name,
            material,
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn has_faces(&self) -> bool {
        !self.indices.is_empty()
    }

    fn push_corner(&mut self, corner: Corner, positions: &[[f32; 3]], normals: &[[f32; 3]]) {
        let index = match self.lookup.get(&corner) {
            Some(&index) => index,
            None => {
                let index = self.positions.len() as u32;
                self.positions.push(positions[corner.position]);
                self.normals.push(corner.normal.map(|n| normals[n]));
                self.lookup.insert(corner, index);
                index
            }
        };
        self.indices.push(index);
    }

    fn finish(self) -> Option<ObjMesh> {
        if self.indices.is_empty() {
            return None;
        }
        let normals = if self.normals.iter().all(Option::is_some) {
            self.normals.into_iter().flatten().collect()
        } else {
            fill_missing_normals(&self.positions, &self.indices, &self.normals)
        };
        Some(ObjMesh {
            name: self.name,
            material: self.material,
            positions: self.positions,
            normals,
            indices: self.indices,
        })
    }
}

/// Area-weighted smooth normals for vertices the file gave none.
fn fill_missing_normals(
    positions: &[[f32; 3]],
    indices: &[u32],
    given: &[Option<[f32; 3]>],
) -> Vec<[f32; 3]> {
    let mut accumulated = vec![glam::Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let pa = glam::Vec3::from(positions[a]);
        let pb = glam::Vec3::from(positions[b]);
        let pc = glam::Vec3::from(positions[c]);
        let face = (pb - pa).cross(pc - pa);
        for vertex in [a, b, c] {
            accumulated[vertex] += face;
        }
    }
    accumulated
        .into_iter()
        .zip(given)
        .map(|(sum, given)| match given {
            Some(normal) => *normal,
            None => sum.try_normalize().unwrap_or(glam::Vec3::Y).to_array(),
        })
        .collect()
}

fn missing(line: usize, keyword: &str, expected: usize) -> ObjError {
    ObjError::MissingComponent {
        line,
        keyword: keyword.to_string(),
        expected,
    }
}

fn parse_float(line: usize, token: &str) -> Result<f32, ObjError> {
    token
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ObjError::BadNumber {
            line,
            token: token.to_string(),
        })
}

fn parse_vec3(line: usize, keyword: &str, args: &[&str]) -> Result<[f32; 3], ObjError> {
    if args.len() < 3 {
        return Err(missing(line, keyword, 3));
    }
    Ok([
        parse_float(line, args[0])?,
        parse_float(line, args[1])?,
        parse_float(line, args[2])?,
    ])
}

fn parse_face_vertex(
    line: usize,
    token: &str,
    position_count: usize,
    normal_count: usize,
) -> Result<Corner, ObjError> {
    let bad = || ObjError::BadFaceVertex {
        line,
        token: token.to_string(),
    };
    let mut fields = token.split('/');
    let position_field = fields.next().filter(|field| !field.is_empty()).ok_or_else(bad)?;
    let _texcoord_field = fields.next();
    let normal_field = fields.next().filter(|field| !field.is_empty());
    if fields.next().is_some() {
        return Err(bad());
    }

    let position = resolve_index(line, position_field, position_count, bad)?;
    let normal = normal_field
        .map(|field| resolve_index(line, field, normal_count, bad))
        .transpose()?;
    Ok(Corner { position, normal })
}

fn resolve_index(
    line: usize,
    field: &str,
    count: usize,
    bad: impl Fn() -> ObjError,
) -> Result<usize, ObjError> {
    let index: i64 = field.parse().map_err(|_| bad())?;
    let resolved = if index > 0 {
        index - 1
    } else {
        count as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(ObjError::IndexOutOfRange { line, index, count });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::{parse, ObjError};

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn quad_is_fan_triangulated_and_shares_vertices() {
        let model = parse(QUAD).unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn missing_normals_are_generated_facing_the_winding() {
        let model = parse(QUAD).unwrap();
        for normal in &model.meshes[0].normals {
            assert!((normal[2] - 1.0).abs() < 1e-6, "{normal:?}");
        }
    }

    #[test]
    fn explicit_normals_and_texcoords_are_honored() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 -1
f 1/1/1 2/2/1 3/3/1
";
        let mesh = &parse(text).unwrap().meshes[0];
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, -1.0]));
    }

    #[test]
    fn negative_indices_count_back_from_the_end() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = &parse(text).unwrap().meshes[0];
        assert_eq!(mesh.positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    }

    #[test]
    fn groups_and_usemtl_split_meshes_and_record_material_names() {
        let text = "\
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
o body
usemtl red
f 1 2 3
usemtl blue
f 1 3 4
g empty
o lid
f 2//1 3 4
vn 0 1 0
";
        // The last face references a normal defined later in the file.
        let err = parse(text).unwrap_err();
        assert_eq!(
            err,
            ObjError::IndexOutOfRange {
                line: 13,
                index: 1,
                count: 0
            }
        );

        let fixed = text.replace("f 2//1 3 4", "f 2 3 4");
        let model = parse(&fixed).unwrap();
        let names: Vec<_> = model.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["body", "body", "lid"]);
        let materials: Vec<_> = model
            .meshes
            .iter()
            .map(|m| m.material.as_deref())
            .collect();
        assert_eq!(materials, vec![Some("red"), Some("blue"), Some("blue")]);
    }

    #[test]
    fn bounds_cover_every_mesh() {
        let text = "v -1 0 0\nv 2 3 0\nv 0 0 -4\nf 1 2 3\n";
        let (min, max) = parse(text).unwrap().bounds().unwrap();
        assert_eq!(min, [-1.0, 0.0, -4.0]);
        assert_eq!(max, [2.0, 3.0, 0.0]);
    }

    #[test]
    fn malformed_input_reports_line_numbers() {
        assert_eq!(
            parse("v 0 0 0\nv 1 x 0\n").unwrap_err(),
            ObjError::BadNumber {
                line: 2,
                token: "x".to_string()
            }
        );
        assert!(matches!(
            parse("v 0 0\n").unwrap_err(),
            ObjError::MissingComponent { line: 1, .. }
        ));
        assert_eq!(
            parse("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err(),
            ObjError::DegenerateFace { line: 3 }
        );
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").unwrap_err(),
            ObjError::IndexOutOfRange { line: 4, index: 9, count: 3 }
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 0 2\n").unwrap_err(),
            ObjError::IndexOutOfRange { index: 0, .. }
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf a 2 3\n").unwrap_err(),
            ObjError::BadFaceVertex { line: 4, .. }
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/2/3/4 2 3\n").unwrap_err(),
            ObjError::BadFaceVertex { line: 4, .. }
        ));
    }

    #[test]
    fn text_without_faces_has_no_geometry() {
        assert_eq!(parse("").unwrap_err(), ObjError::NoGeometry);
        assert_eq!(
            parse("hello world\nthis is not a mesh\n").unwrap_err(),
            ObjError::NoGeometry
        );
        assert_eq!(parse("v 0 0 0\nv 1 1 1\n").unwrap_err(), ObjError::NoGeometry);
    }
}
