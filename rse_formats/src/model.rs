use std::fs::File;
use std::path::Path;

use memmap2::MmapOptions;
use serde::Serialize;

use crate::cursor::{ByteCursor, SizedString};
use crate::cxp::CxpSource;
use crate::error::{DecodeError, LoadError};
use crate::events::{DecodeEvent, DecodeSink, LogSink};
use crate::geometry::{GeometryBody, GeometryListHeader, GeometryObject, ModelKind};
use crate::material::{MaterialListHeader, MaterialRecord, resolve_cxp};

const MIN_MATERIAL_SIZE: usize = 4 + 4 + 4 + 4 + 4 + 4 + 4 + 9 + 4 + 1;
const MIN_OBJECT_SIZE: usize = 4 + 4 + 4 + 4 + 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFile {
    kind: ModelKind,
    header: SizedString,
    material_list: MaterialListHeader,
    materials: Vec<MaterialRecord>,
    geometry_list: GeometryListHeader,
    objects: Vec<GeometryObject>,
    footer: SizedString,
}

/// A mesh whose geometry flags carry bits outside the known flag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnevaluatedFlags<'a> {
    pub object: &'a str,
    pub mesh: &'a str,
    pub raw: u32,
    pub unevaluated_bits: u32,
}

impl ModelFile {
    /// Decodes `bytes`, reporting progress through the `log` facade.
    pub fn from_bytes(
        bytes: &[u8],
        kind: ModelKind,
        cxp: &dyn CxpSource,
    ) -> Result<Self, DecodeError> {
        Self::decode_with(bytes, kind, cxp, &mut LogSink)
    }

    /// Bytes after the footer are ignored.
    pub fn decode_with(
        bytes: &[u8],
        kind: ModelKind,
        cxp: &dyn CxpSource,
        sink: &mut dyn DecodeSink,
    ) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);

        let header = cursor.read_sized_string("header begin message")?;
        sink.event(DecodeEvent::HeaderRead {
            kind,
            message: header.text.clone(),
        });

        let material_list = MaterialListHeader::read(&mut cursor)?;
        sink.event(DecodeEvent::MaterialListRead {
            count: material_list.count,
        });

        let records = cxp.records();
        sink.event(DecodeEvent::CxpRecordsAvailable {
            count: records.len(),
        });

        let mut materials = Vec::with_capacity(
            cursor.capacity_hint(material_list.count, MIN_MATERIAL_SIZE),
        );
        for index in 0..material_list.count {
            let material = MaterialRecord::read(&mut cursor)?;
            sink.event(DecodeEvent::MaterialRead {
                index,
                name: material.name().to_string(),
                texture: material.texture_name().to_string(),
                game_version: material.game_version,
            });
            materials.push(material);
        }
        let matched = resolve_cxp(&mut materials, records);
        sink.event(DecodeEvent::CxpResolved {
            matched,
            materials: materials.len(),
        });

        let geometry_list = GeometryListHeader::read(&mut cursor)?;
        sink.event(DecodeEvent::GeometryListRead {
            count: geometry_list.count,
        });

        let mut objects =
            Vec::with_capacity(cursor.capacity_hint(geometry_list.count, MIN_OBJECT_SIZE));
        for index in 0..geometry_list.count {
            let object = GeometryObject::read(&mut cursor, kind)?;
            sink.event(DecodeEvent::GeometryObjectRead {
                index,
                name: object.name().to_string(),
                vertices: object.vertices.len(),
                meshes: object.mesh_count(),
            });
            objects.push(object);
        }

        let footer = cursor.read_sized_string("footer end message")?;
        sink.event(DecodeEvent::FooterRead {
            message: footer.text.clone(),
        });

        Ok(ModelFile {
            kind,
            header,
            material_list,
            materials,
            geometry_list,
            objects,
            footer,
        })
    }

    /// Memory-maps and decodes a model, taking its kind from the extension.
    pub fn open(path: impl AsRef<Path>, cxp: &dyn CxpSource) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let kind = ModelKind::from_path(path).ok_or_else(|| LoadError::UnknownKind {
            path: path.to_path_buf(),
        })?;
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(io_error)?;
        Self::from_bytes(&mmap, kind, cxp).map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn header_message(&self) -> &str {
        self.header.as_str()
    }

    pub fn material_list(&self) -> &MaterialListHeader {
        &self.material_list
    }

    pub fn materials(&self) -> &[MaterialRecord] {
        &self.materials
    }

    pub fn geometry_list(&self) -> &GeometryListHeader {
        &self.geometry_list
    }

    pub fn objects(&self) -> &[GeometryObject] {
        &self.objects
    }

    pub fn footer_message(&self) -> &str {
        self.footer.as_str()
    }

    pub fn material(&self, index: u32) -> Option<&MaterialRecord> {
        self.materials.get(index as usize)
    }

    pub fn object_by_name(&self, name: &str) -> Option<&GeometryObject> {
        self.objects.iter().find(|object| object.name() == name)
    }

    /// SOB meshes carrying flag bits that no known flag accounts for.
    pub fn meshes_with_unevaluated_flags(&self) -> Vec<UnevaluatedFlags<'_>> {
        let mut found = Vec::new();
        for object in &self.objects {
            let GeometryBody::Sob(sob) = &object.body else {
                continue;
            };
            for mesh in sob.meshes.iter().filter(|mesh| mesh.flags.unevaluated) {
                found.push(UnevaluatedFlags {
                    object: object.name(),
                    mesh: mesh.name.as_str(),
                    raw: mesh.flags.raw,
                    unevaluated_bits: mesh.flags.unevaluated_bits(),
                });
            }
        }
        found
    }
}
