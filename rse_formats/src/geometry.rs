use std::path::Path;

use serde::Serialize;

use crate::color::{normalize_rgb, pad_alpha};
use crate::cursor::{ByteCursor, SizedString};
use crate::error::DecodeError;
use crate::flags::GeometryFlags;
use crate::name::{VERSION_TAG_TEXT, VersionedName};

/// Face material index meaning "no material assigned".
pub const NO_MATERIAL: u32 = u32::MAX;

const VERTEX_SIZE: usize = 12;
const VERTEX_PARAM_SIZE: usize = 12 + 8 + 4 + 3;
const FACE_SIZE: usize = 12 + 12 + 16 + 4;
const MIN_SOB_MESH_SIZE: usize = 30;
const MIN_QOB_MESH_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    Sob,
    Qob,
}

impl ModelKind {
    pub fn extension(self) -> &'static str {
        match self {
            ModelKind::Sob => "sob",
            ModelKind::Qob => "qob",
        }
    }

    /// Infers the kind from a file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        [ModelKind::Sob, ModelKind::Qob]
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryListHeader {
    pub size: u32,
    pub id: u32,
    pub label: SizedString,
    pub count: usize,
}

impl GeometryListHeader {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let size = cursor.read_u32("geometry list size")?;
        let id = cursor.read_u32("geometry list id")?;
        let label = cursor.read_sized_string("geometry list label")?;
        let count = cursor.read_count("geometry object count")?;
        Ok(GeometryListHeader {
            size,
            id,
            label,
            count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryObject {
    pub size: u32,
    pub id: u32,
    pub name: VersionedName,
    pub vertices: Vec<[f32; 3]>,
    pub body: GeometryBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryBody {
    Sob(SobGeometry),
    Qob(QobGeometry),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SobGeometry {
    /// Two unidentified words that only follow a versioned name.
    pub reserved: Option<[u32; 2]>,
    pub vertex_params: Vec<VertexParam>,
    pub faces: Vec<Face>,
    pub meshes: Vec<SobMesh>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QobGeometry {
    pub meshes: Vec<QobMesh>,
}

/// Normal, UV and color for one face corner. Faces reference these by index,
/// separately from the vertex position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VertexParam {
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub reserved: f32,
    pub color: [u8; 3],
}

impl VertexParam {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(VertexParam {
            normal: cursor.read_f32_array::<3>("vertex param normal")?,
            uv: cursor.read_f32_array::<2>("vertex param uv")?,
            reserved: cursor.read_f32("vertex param reserved field")?,
            color: cursor.read_rgb24("vertex param color")?,
        })
    }

    /// Color as RGBA in the 0.0–1.0 range with opaque alpha.
    pub fn rgba(&self) -> [f32; 4] {
        pad_alpha(normalize_rgb(self.color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Face {
    pub vertex_indices: [u32; 3],
    pub param_indices: [u32; 3],
    pub normal: [f32; 4],
    pub material_index: u32,
}

impl Face {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Face {
            vertex_indices: cursor.read_u32_array::<3>("face vertex indices")?,
            param_indices: cursor.read_u32_array::<3>("face vertex param indices")?,
            normal: cursor.read_f32_array::<4>("face normal")?,
            material_index: cursor.read_u32("face material index")?,
        })
    }

    /// Material index, or `None` for [`NO_MATERIAL`].
    pub fn material(&self) -> Option<u32> {
        (self.material_index != NO_MATERIAL).then_some(self.material_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SobMesh {
    pub reserved: u32,
    pub name: SizedString,
    /// Vertices used by the mesh. Informational only; faces carry their own
    /// vertex indices.
    pub vertex_indices: Vec<u32>,
    /// Indices into the owning object's face list.
    pub face_indices: Vec<u32>,
    pub flags: GeometryFlags,
    pub reserved_name: SizedString,
    pub reserved_trailer: u32,
}

impl SobMesh {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let reserved = cursor.read_u32("mesh reserved field")?;
        let name = cursor.read_sized_string("mesh name")?;
        let vertex_count = cursor.read_count("mesh vertex index count")?;
        let vertex_indices =
            cursor.read_list(vertex_count, 4, |cursor| cursor.read_u32("mesh vertex index"))?;
        let face_count = cursor.read_count("mesh face index count")?;
        let face_indices =
            cursor.read_list(face_count, 4, |cursor| cursor.read_u32("mesh face index"))?;
        let flags = GeometryFlags::from_raw(cursor.read_u32("mesh geometry flags")?);
        let reserved_name = cursor.read_sized_string("mesh reserved string")?;
        let reserved_trailer = cursor.read_u32("mesh reserved trailer")?;
        Ok(SobMesh {
            reserved,
            name,
            vertex_indices,
            face_indices,
            flags,
            reserved_name,
            reserved_trailer,
        })
    }
}

/// A QOB mesh. Face arrays run in parallel, as do the texture vertex arrays;
/// texture indices address this mesh's texture vertices only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QobMesh {
    pub material_index: u32,
    pub face_normals: Vec<[f32; 4]>,
    pub face_vertex_indices: Vec<[u16; 3]>,
    pub face_texture_indices: Vec<[u16; 3]>,
    pub texture_normals: Vec<[f32; 3]>,
    pub texture_uvs: Vec<[f32; 2]>,
    pub texture_colors: Vec<[f32; 4]>,
}

impl QobMesh {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let material_index = cursor.read_u32("QOB mesh material index")?;

        let face_count = cursor.read_count("QOB mesh face count")?;
        let face_normals = cursor.read_list(face_count, 16, |cursor| {
            cursor.read_f32_array::<4>("QOB face normal")
        })?;
        let face_vertex_indices = cursor.read_list(face_count, 6, |cursor| {
            cursor.read_u16_array::<3>("QOB face vertex indices")
        })?;
        let face_texture_indices = cursor.read_list(face_count, 6, |cursor| {
            cursor.read_u16_array::<3>("QOB face texture indices")
        })?;

        let texture_count = cursor.read_count("QOB texture vertex count")?;
        let texture_normals = cursor.read_list(texture_count, 12, |cursor| {
            cursor.read_f32_array::<3>("QOB texture vertex normal")
        })?;
        let texture_uvs = cursor.read_list(texture_count, 8, |cursor| {
            cursor.read_f32_array::<2>("QOB texture vertex uv")
        })?;
        let texture_colors = cursor.read_list(texture_count, 16, |cursor| {
            cursor.read_rgba32f("QOB texture vertex color")
        })?;

        Ok(QobMesh {
            material_index,
            face_normals,
            face_vertex_indices,
            face_texture_indices,
            texture_normals,
            texture_uvs,
            texture_colors,
        })
    }

    pub fn face_count(&self) -> usize {
        self.face_vertex_indices.len()
    }

    pub fn texture_vertex_count(&self) -> usize {
        self.texture_uvs.len()
    }

    pub fn material(&self) -> Option<u32> {
        (self.material_index != NO_MATERIAL).then_some(self.material_index)
    }
}

impl GeometryObject {
    pub fn read(cursor: &mut ByteCursor<'_>, kind: ModelKind) -> Result<Self, DecodeError> {
        let size = cursor.read_u32("geometry object size")?;
        let id = cursor.read_u32("geometry object id")?;
        let first = cursor.read_sized_string("geometry object name or version tag")?;
        let name = if first.as_str() == VERSION_TAG_TEXT {
            let version = cursor.read_u32("geometry object version number")?;
            let name = cursor.read_sized_string("geometry object name")?;
            VersionedName::Tagged { version, name }
        } else {
            VersionedName::Untagged { name: first }
        };

        let reserved = match (&name, kind) {
            (VersionedName::Tagged { .. }, ModelKind::Sob) => {
                Some(cursor.read_u32_array::<2>("geometry object reserved fields")?)
            }
            _ => None,
        };

        let vertex_count = cursor.read_count("vertex count")?;
        let vertices = cursor.read_list(vertex_count, VERTEX_SIZE, |cursor| {
            cursor.read_f32_array::<3>("vertex")
        })?;

        let body = match kind {
            ModelKind::Sob => GeometryBody::Sob(read_sob_body(cursor, reserved, vertices.len())?),
            ModelKind::Qob => {
                let mesh_count = cursor.read_count("mesh count")?;
                let meshes = cursor.read_list(mesh_count, MIN_QOB_MESH_SIZE, QobMesh::read)?;
                GeometryBody::Qob(QobGeometry { meshes })
            }
        };

        Ok(GeometryObject {
            size,
            id,
            name,
            vertices,
            body,
        })
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn kind(&self) -> ModelKind {
        match self.body {
            GeometryBody::Sob(_) => ModelKind::Sob,
            GeometryBody::Qob(_) => ModelKind::Qob,
        }
    }

    pub fn as_sob(&self) -> Option<&SobGeometry> {
        match &self.body {
            GeometryBody::Sob(sob) => Some(sob),
            GeometryBody::Qob(_) => None,
        }
    }

    pub fn as_qob(&self) -> Option<&QobGeometry> {
        match &self.body {
            GeometryBody::Qob(qob) => Some(qob),
            GeometryBody::Sob(_) => None,
        }
    }

    pub fn mesh_count(&self) -> usize {
        match &self.body {
            GeometryBody::Sob(sob) => sob.meshes.len(),
            GeometryBody::Qob(qob) => qob.meshes.len(),
        }
    }
}

fn read_sob_body(
    cursor: &mut ByteCursor<'_>,
    reserved: Option<[u32; 2]>,
    vertex_count: usize,
) -> Result<SobGeometry, DecodeError> {
    let param_count = cursor.read_count("vertex param count")?;
    let vertex_params = cursor.read_list(param_count, VERTEX_PARAM_SIZE, VertexParam::read)?;

    let face_count = cursor.read_count("face count")?;
    let faces_offset = cursor.position();
    let faces = cursor.read_list(face_count, FACE_SIZE, Face::read)?;

    for (face_index, face) in faces.iter().enumerate() {
        let bad_vertex = face
            .vertex_indices
            .iter()
            .find(|&&index| index as usize >= vertex_count);
        let bad_param = face
            .param_indices
            .iter()
            .find(|&&index| index as usize >= param_count);
        let detail = match (bad_vertex, bad_param) {
            (Some(index), _) => {
                format!("face {face_index} uses vertex {index} but only {vertex_count} vertices exist")
            }
            (None, Some(index)) => format!(
                "face {face_index} uses vertex param {index} but only {param_count} params exist"
            ),
            (None, None) => continue,
        };
        return Err(cursor.format_error(
            faces_offset + face_index * FACE_SIZE,
            "face indices",
            detail,
        ));
    }

    let mesh_count = cursor.read_count("mesh count")?;
    let meshes = cursor.read_list(mesh_count, MIN_SOB_MESH_SIZE, SobMesh::read)?;

    Ok(SobGeometry {
        reserved,
        vertex_params,
        faces,
        meshes,
    })
}
