use std::collections::HashMap;

use serde::Serialize;

use crate::error::AssembleError;
use crate::geometry::{GeometryBody, GeometryObject, QobMesh, SobMesh};

/// Deduplicated, indexed triangles sharing one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableArray {
    /// `None` when the faces carry the "no material" sentinel.
    pub material_index: Option<u32>,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub triangles: Vec<[u32; 3]>,
}

impl RenderableArray {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Insertion-ordered set of (vertex index, attribute index) pairs.
#[derive(Debug, Default)]
struct CornerTable {
    entries: Vec<(u32, u32)>,
    positions: HashMap<(u32, u32), u32>,
}

impl CornerTable {
    fn position(&mut self, corner: (u32, u32)) -> u32 {
        if let Some(&position) = self.positions.get(&corner) {
            return position;
        }
        let position = self.entries.len() as u32;
        self.entries.push(corner);
        self.positions.insert(corner, position);
        position
    }
}

#[derive(Debug)]
struct Partition {
    material_index: Option<u32>,
    corners: CornerTable,
    triangles: Vec<[u32; 3]>,
}

/// Builds one renderable per distinct material used by `mesh`'s faces, in
/// order of first use.
pub fn assemble_sob_mesh(
    object: &GeometryObject,
    mesh: &SobMesh,
) -> Result<Vec<RenderableArray>, AssembleError> {
    let GeometryBody::Sob(sob) = &object.body else {
        return Err(AssembleError::NotSob {
            name: object.name().to_string(),
        });
    };

    let mut partitions: Vec<Partition> = Vec::new();
    for &face_index in &mesh.face_indices {
        let face = sob
            .faces
            .get(face_index as usize)
            .ok_or(AssembleError::IndexOutOfRange {
                what: "face",
                index: face_index,
                len: sob.faces.len(),
            })?;

        let material_index = face.material();
        let slot = match partitions
            .iter()
            .position(|partition| partition.material_index == material_index)
        {
            Some(slot) => slot,
            None => {
                partitions.push(Partition {
                    material_index,
                    corners: CornerTable::default(),
                    triangles: Vec::new(),
                });
                partitions.len() - 1
            }
        };

        let partition = &mut partitions[slot];
        let triangle = [0, 1, 2].map(|corner| {
            partition
                .corners
                .position((face.vertex_indices[corner], face.param_indices[corner]))
        });
        partition.triangles.push(triangle);
    }

    partitions
        .into_iter()
        .map(|partition| -> Result<RenderableArray, AssembleError> {
            let mut renderable = empty_renderable(partition.material_index, partition.triangles);
            for &(vertex_index, param_index) in &partition.corners.entries {
                let vertex = lookup(&object.vertices, vertex_index, "vertex")?;
                let param = lookup(&sob.vertex_params, param_index, "vertex param")?;
                renderable.vertices.push(*vertex);
                renderable.normals.push(param.normal);
                renderable.uvs.push(param.uv);
                renderable.colors.push(param.rgba());
            }
            Ok(renderable)
        })
        .collect()
}

/// Builds a renderable for a QOB mesh. Corners pair an object vertex with one
/// of the mesh's own texture vertices.
pub fn assemble_qob_mesh(
    object: &GeometryObject,
    mesh: &QobMesh,
) -> Result<RenderableArray, AssembleError> {
    let mut corners = CornerTable::default();
    let mut triangles = Vec::with_capacity(mesh.face_count());
    for (vertex_indices, texture_indices) in mesh
        .face_vertex_indices
        .iter()
        .zip(&mesh.face_texture_indices)
    {
        let triangle = [0, 1, 2].map(|corner| {
            corners.position((
                u32::from(vertex_indices[corner]),
                u32::from(texture_indices[corner]),
            ))
        });
        triangles.push(triangle);
    }

    let mut renderable = empty_renderable(mesh.material(), triangles);
    for &(vertex_index, texture_index) in &corners.entries {
        renderable
            .vertices
            .push(*lookup(&object.vertices, vertex_index, "vertex")?);
        renderable
            .normals
            .push(*lookup(&mesh.texture_normals, texture_index, "texture normal")?);
        renderable
            .uvs
            .push(*lookup(&mesh.texture_uvs, texture_index, "texture uv")?);
        renderable
            .colors
            .push(*lookup(&mesh.texture_colors, texture_index, "texture color")?);
    }
    Ok(renderable)
}

/// Renderables for every mesh of `object`, mesh by mesh.
pub fn assemble_object(object: &GeometryObject) -> Result<Vec<RenderableArray>, AssembleError> {
    let mut renderables = Vec::new();
    match &object.body {
        GeometryBody::Sob(sob) => {
            for mesh in &sob.meshes {
                renderables.extend(assemble_sob_mesh(object, mesh)?);
            }
        }
        GeometryBody::Qob(qob) => {
            for mesh in &qob.meshes {
                renderables.push(assemble_qob_mesh(object, mesh)?);
            }
        }
    }
    Ok(renderables)
}

fn empty_renderable(material_index: Option<u32>, triangles: Vec<[u32; 3]>) -> RenderableArray {
    RenderableArray {
        material_index,
        vertices: Vec::new(),
        normals: Vec::new(),
        uvs: Vec::new(),
        colors: Vec::new(),
        triangles,
    }
}

fn lookup<'a, T>(values: &'a [T], index: u32, what: &'static str) -> Result<&'a T, AssembleError> {
    values
        .get(index as usize)
        .ok_or(AssembleError::IndexOutOfRange {
            what,
            index,
            len: values.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SizedString;
    use crate::flags::GeometryFlags;
    use crate::geometry::{Face, NO_MATERIAL, QobGeometry, SobGeometry, VertexParam};
    use crate::name::VersionedName;

    fn param(u: f32, color: [u8; 3]) -> VertexParam {
        VertexParam {
            normal: [0.0, 0.0, 1.0],
            uv: [u, 0.0],
            reserved: 0.0,
            color,
        }
    }

    fn face(vertices: [u32; 3], params: [u32; 3], material_index: u32) -> Face {
        Face {
            vertex_indices: vertices,
            param_indices: params,
            normal: [0.0, 0.0, 1.0, 0.0],
            material_index,
        }
    }

    fn mesh(face_indices: Vec<u32>) -> SobMesh {
        SobMesh {
            reserved: 0,
            name: SizedString::new("mesh"),
            vertex_indices: Vec::new(),
            face_indices,
            flags: GeometryFlags::from_raw(0),
            reserved_name: SizedString::new(""),
            reserved_trailer: 0,
        }
    }

    fn object(faces: Vec<Face>, meshes: Vec<SobMesh>) -> GeometryObject {
        GeometryObject {
            size: 0,
            id: 0,
            name: VersionedName::Untagged {
                name: SizedString::new("object"),
            },
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            body: GeometryBody::Sob(SobGeometry {
                reserved: None,
                vertex_params: vec![
                    param(0.0, [255, 0, 0]),
                    param(0.25, [0, 255, 0]),
                    param(0.5, [0, 0, 255]),
                    param(0.75, [51, 51, 51]),
                ],
                faces,
                meshes,
            }),
        }
    }

    #[test]
    fn single_triangle_maps_one_to_one() {
        let object = object(vec![face([0, 1, 2], [0, 1, 2], 0)], Vec::new());
        let renderables = assemble_sob_mesh(&object, &mesh(vec![0])).unwrap();

        assert_eq!(renderables.len(), 1);
        let renderable = &renderables[0];
        assert_eq!(renderable.material_index, Some(0));
        assert_eq!(renderable.vertex_count(), 3);
        assert_eq!(renderable.triangles, [[0, 1, 2]]);
        assert_eq!(renderable.vertices[2], [1.0, 1.0, 0.0]);
        assert_eq!(renderable.uvs[1], [0.25, 0.0]);
        assert_eq!(renderable.colors[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(renderable.colors[2], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn shared_corners_are_reused() {
        // A quad split along the 0-2 diagonal with shared attributes.
        let faces = vec![face([0, 1, 2], [0, 1, 2], 0), face([0, 2, 3], [0, 2, 3], 0)];
        let object = object(faces, Vec::new());
        let renderables = assemble_sob_mesh(&object, &mesh(vec![0, 1])).unwrap();

        let renderable = &renderables[0];
        assert_eq!(renderable.vertex_count(), 4);
        assert_eq!(renderable.triangles, [[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn same_vertex_with_different_params_is_split() {
        let faces = vec![face([0, 1, 2], [0, 1, 2], 0), face([0, 2, 3], [1, 2, 3], 0)];
        let object = object(faces, Vec::new());
        let renderable = &assemble_sob_mesh(&object, &mesh(vec![0, 1])).unwrap()[0];

        let copies_of_vertex_zero = renderable
            .vertices
            .iter()
            .filter(|&&vertex| vertex == [0.0, 0.0, 0.0])
            .count();
        assert!(copies_of_vertex_zero >= 2);
        assert_eq!(renderable.vertex_count(), 5);
        assert_eq!(renderable.triangles, [[0, 1, 2], [3, 2, 4]]);
        assert_eq!(renderable.uvs[3], [0.25, 0.0]);
    }

    #[test]
    fn partitions_follow_first_material_use() {
        let faces = vec![
            face([0, 1, 2], [0, 1, 2], 4),
            face([0, 2, 3], [0, 2, 3], NO_MATERIAL),
            face([1, 2, 3], [1, 2, 3], 4),
        ];
        let object = object(faces, Vec::new());
        let renderables = assemble_sob_mesh(&object, &mesh(vec![0, 1, 2])).unwrap();

        let materials: Vec<_> = renderables.iter().map(|r| r.material_index).collect();
        assert_eq!(materials, [Some(4), None]);
        assert_eq!(renderables[0].triangle_count(), 2);
        assert_eq!(renderables[0].vertex_count(), 4);
        assert_eq!(renderables[1].triangles, [[0, 1, 2]]);
    }

    #[test]
    fn output_is_deterministic() {
        let faces = vec![
            face([3, 1, 0], [3, 1, 0], 2),
            face([0, 2, 3], [1, 2, 3], 1),
            face([1, 2, 3], [1, 2, 0], 2),
            face([2, 0, 1], [2, 0, 1], 1),
        ];
        let object = object(faces, Vec::new());
        let mesh = mesh(vec![3, 0, 2, 1]);
        let first = assemble_sob_mesh(&object, &mesh).unwrap();
        for _ in 0..8 {
            assert_eq!(assemble_sob_mesh(&object, &mesh).unwrap(), first);
        }
    }

    #[test]
    fn out_of_range_indices_are_reported() {
        let object = object(vec![face([0, 1, 9], [0, 1, 2], 0)], Vec::new());
        assert_eq!(
            assemble_sob_mesh(&object, &mesh(vec![1])).unwrap_err(),
            AssembleError::IndexOutOfRange {
                what: "face",
                index: 1,
                len: 1
            }
        );
        assert_eq!(
            assemble_sob_mesh(&object, &mesh(vec![0])).unwrap_err(),
            AssembleError::IndexOutOfRange {
                what: "vertex",
                index: 9,
                len: 4
            }
        );
    }

    #[test]
    fn qob_objects_are_rejected_by_the_sob_path() {
        let qob_mesh = QobMesh {
            material_index: 1,
            face_normals: vec![[0.0, 0.0, 1.0, 0.0]; 2],
            face_vertex_indices: vec![[0, 1, 2], [0, 2, 3]],
            face_texture_indices: vec![[0, 1, 2], [0, 2, 1]],
            texture_normals: vec![[0.0, 1.0, 0.0]; 3],
            texture_uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
            texture_colors: vec![[1.0, 1.0, 1.0, 0.5]; 3],
        };
        let mut qob = object(Vec::new(), Vec::new());
        qob.body = GeometryBody::Qob(QobGeometry {
            meshes: vec![qob_mesh],
        });

        assert!(matches!(
            assemble_sob_mesh(&qob, &mesh(vec![0])),
            Err(AssembleError::NotSob { .. })
        ));

        let renderables = assemble_object(&qob).unwrap();
        assert_eq!(renderables.len(), 1);
        let renderable = &renderables[0];
        assert_eq!(renderable.material_index, Some(1));
        // Only (3, 1) is new in the second face.
        assert_eq!(renderable.triangles, [[0, 1, 2], [0, 2, 3]]);
        assert_eq!(renderable.vertex_count(), 4);
        assert_eq!(renderable.vertices[3], [0.0, 1.0, 0.0]);
        assert_eq!(renderable.uvs[3], [1.0, 0.0]);
        assert_eq!(renderable.colors[0], [1.0, 1.0, 1.0, 0.5]);
    }

    #[test]
    fn whole_object_covers_every_mesh() {
        let faces = vec![face([0, 1, 2], [0, 1, 2], 0), face([0, 2, 3], [0, 2, 3], 1)];
        let object = object(faces, vec![mesh(vec![0]), mesh(vec![1, 0])]);
        let renderables = assemble_object(&object).unwrap();
        let materials: Vec<_> = renderables.iter().map(|r| r.material_index).collect();
        assert_eq!(materials, [Some(0), Some(1), Some(0)]);
    }
}
