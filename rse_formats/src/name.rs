use std::fmt;

use serde::Serialize;

use crate::cursor::SizedString;

/// Raw bytes of the sized string that marks a versioned record.
pub const VERSION_TAG: &[u8] = b"Version\0";

/// Text of the version tag once decoded.
pub const VERSION_TAG_TEXT: &str = "Version";

/// Name of a material or geometry object.
///
/// Newer files put a `Version` string plus a version number where older
/// files put the name, and only then store the real name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum VersionedName {
    Tagged { version: u32, name: SizedString },
    Untagged { name: SizedString },
}

impl VersionedName {
    pub fn name(&self) -> &str {
        self.sized().as_str()
    }

    pub fn sized(&self) -> &SizedString {
        match self {
            VersionedName::Tagged { name, .. } | VersionedName::Untagged { name } => name,
        }
    }

    pub fn version(&self) -> Option<u32> {
        match self {
            VersionedName::Tagged { version, .. } => Some(*version),
            VersionedName::Untagged { .. } => None,
        }
    }

    /// Declared length of the tag string, 0 when there is no tag.
    pub fn tag_len(&self) -> u32 {
        match self {
            VersionedName::Tagged { .. } => VERSION_TAG.len() as u32,
            VersionedName::Untagged { .. } => 0,
        }
    }
}

impl fmt::Display for VersionedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
