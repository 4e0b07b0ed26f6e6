use std::sync::Arc;

use serde::Serialize;

use crate::color::MaterialColor;
use crate::cursor::{ByteCursor, SizedString, decode_text};
use crate::cxp::{CxpRecord, find_record};
use crate::error::DecodeError;
use crate::name::{VERSION_TAG, VersionedName};

/// Size of a Rainbow Six material record once the name, tag and texture
/// strings are subtracted.
pub const RAINBOW_SIX_MATERIAL_FIXED_SIZE: i64 = 42;

/// Size of a Rogue Spear material record once the texture string is
/// subtracted.
pub const ROGUE_SPEAR_MATERIAL_FIXED_SIZE: i64 = 69;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialListHeader {
    pub size: u32,
    pub reserved: u32,
    pub begin_message: SizedString,
    pub count: usize,
}

impl MaterialListHeader {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let size = cursor.read_u32("material list size")?;
        let reserved = cursor.read_u32("material list reserved field")?;
        let begin_message = cursor.read_sized_string("material list begin message")?;
        let count = cursor.read_count("material count")?;
        Ok(MaterialListHeader {
            size,
            reserved,
            begin_message,
            count,
        })
    }
}

/// How the texture alpha channel is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlphaMethod {
    Opaque,
    Unknown,
    MethodLookup,
    /// Any value the format tables do not name, kept as stored.
    Raw(u32),
}

impl AlphaMethod {
    pub fn raw(self) -> u32 {
        match self {
            AlphaMethod::Opaque => 1,
            AlphaMethod::Unknown => 2,
            AlphaMethod::MethodLookup => 3,
            AlphaMethod::Raw(value) => value,
        }
    }
}

impl From<u32> for AlphaMethod {
    fn from(value: u32) -> Self {
        match value {
            1 => AlphaMethod::Opaque,
            2 => AlphaMethod::Unknown,
            3 => AlphaMethod::MethodLookup,
            other => AlphaMethod::Raw(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameVersion {
    RainbowSix,
    RogueSpear,
}

/// Infers which game wrote a material record from its declared size.
///
/// Returns `None` when neither layout fits; the colors that follow cannot
/// be read in that case.
pub fn classify_game_version(
    size: u32,
    name: &VersionedName,
    texture_name_len: u32,
) -> Option<GameVersion> {
    let size = i64::from(size);
    let name_len = i64::from(name.sized().declared_len);
    let tag_len = i64::from(name.tag_len());
    let texture_len = i64::from(texture_name_len);

    if size - name_len - tag_len - texture_len == RAINBOW_SIX_MATERIAL_FIXED_SIZE
        || name.version().is_none()
    {
        return Some(GameVersion::RainbowSix);
    }
    if size - texture_len == ROGUE_SPEAR_MATERIAL_FIXED_SIZE {
        return Some(GameVersion::RogueSpear);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRecord {
    pub size: u32,
    pub id: u32,
    pub name: VersionedName,
    pub texture_name: SizedString,
    pub opacity: f32,
    /// Believed to control self illumination; meaning not confirmed.
    pub emissive: f32,
    pub alpha_method: AlphaMethod,
    pub game_version: GameVersion,
    pub ambient: MaterialColor,
    pub diffuse: MaterialColor,
    pub specular: MaterialColor,
    pub specular_level: f32,
    pub two_sided: bool,
    pub cxp: Option<Arc<CxpRecord>>,
}

impl MaterialRecord {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let size = cursor.read_u32("material size")?;
        let id = cursor.read_u32("material id")?;
        let name = read_material_name(cursor)?;
        let texture_name = cursor.read_sized_string("material texture name")?;
        let opacity = cursor.read_f32("material opacity")?;
        let emissive = cursor.read_f32("material emissive")?;
        let alpha_method = AlphaMethod::from(cursor.read_u32("material alpha method")?);

        let colors_offset = cursor.position();
        let game_version = classify_game_version(size, &name, texture_name.declared_len)
            .ok_or_else(|| {
                cursor.format_error(
                    colors_offset,
                    "material colors",
                    format!(
                        "material {:?} of size {size} matches neither the Rainbow Six nor the Rogue Spear layout",
                        name.name()
                    ),
                )
            })?;

        let ambient = read_color(cursor, game_version, "material ambient color")?;
        let diffuse = read_color(cursor, game_version, "material diffuse color")?;
        let specular = read_color(cursor, game_version, "material specular color")?;

        let specular_level = cursor.read_f32("material specular level")?;
        let two_sided = cursor.read_u8("material two sided flag")? != 0;

        Ok(MaterialRecord {
            size,
            id,
            name,
            texture_name,
            opacity,
            emissive,
            alpha_method,
            game_version,
            ambient,
            diffuse,
            specular,
            specular_level,
            two_sided,
            cxp: None,
        })
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn texture_name(&self) -> &str {
        self.texture_name.as_str()
    }
}

fn read_color(
    cursor: &mut ByteCursor<'_>,
    game_version: GameVersion,
    expected: &'static str,
) -> Result<MaterialColor, DecodeError> {
    match game_version {
        GameVersion::RainbowSix => cursor.read_rgb24(expected).map(MaterialColor::Rgb24),
        GameVersion::RogueSpear => cursor.read_rgba32f(expected).map(MaterialColor::Rgba32F),
    }
}

/// The name slot holds either the material name or an 8 byte `Version` tag
/// that is followed by a version number and then the real name.
fn read_material_name(cursor: &mut ByteCursor<'_>) -> Result<VersionedName, DecodeError> {
    let text_offset = cursor.position() + 4;
    let first = cursor.read_sized_bytes("material name or version tag")?;
    if first == VERSION_TAG {
        let version = cursor.read_u32("material version number")?;
        let name = cursor.read_sized_string("material name")?;
        return Ok(VersionedName::Tagged { version, name });
    }

    let text = decode_text(first, text_offset, "material name")?;
    Ok(VersionedName::Untagged {
        name: SizedString {
            text,
            declared_len: first.len() as u32,
        },
    })
}

/// Attaches the first CXP record whose name matches each material's texture
/// name, ignoring case. Returns how many materials found a match.
pub fn resolve_cxp(materials: &mut [MaterialRecord], records: &[Arc<CxpRecord>]) -> usize {
    let mut matched = 0;
    for material in materials.iter_mut() {
        material.cxp = find_record(records, material.texture_name()).cloned();
        if material.cxp.is_some() {
            matched += 1;
        }
    }
    matched
}
