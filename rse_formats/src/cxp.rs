use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::LoadError;

const TEXTURE_DIR: &str = "texture";
const CXP_EXTENSION: &str = "cxp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CxpRecord {
    pub material_name: String,
    pub properties: Vec<String>,
}

impl CxpRecord {
    pub fn new(material_name: impl Into<String>, properties: Vec<String>) -> Self {
        CxpRecord {
            material_name: material_name.into(),
            properties,
        }
    }
}

/// Anything that can hand the decoder a list of CXP records.
///
/// Implementations are read-only once built, so a single source can back
/// decodes running on several threads.
pub trait CxpSource: Send + Sync {
    fn records(&self) -> &[Arc<CxpRecord>];
}

#[derive(Debug, Clone, Default)]
pub struct CxpStore {
    records: Vec<Arc<CxpRecord>>,
}

impl CxpStore {
    pub fn new(records: impl IntoIterator<Item = CxpRecord>) -> Self {
        CxpStore {
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    /// Loads every CXP file below `<root>/texture` for the mod root (if any)
    /// and then the game data root. Mod records come first so they win
    /// first-match lookups.
    pub fn load(data_root: &Path, mod_root: Option<&Path>) -> Result<Self, LoadError> {
        let mut records = Vec::new();
        for root in mod_root.into_iter().chain(std::iter::once(data_root)) {
            for path in find_cxp_files(root) {
                records.extend(read_cxp_file(&path)?);
            }
        }
        log::debug!("loaded {} CXP records", records.len());
        Ok(CxpStore::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose name matches case-insensitively.
    pub fn find(&self, name: &str) -> Option<&Arc<CxpRecord>> {
        find_record(&self.records, name)
    }
}

impl CxpSource for CxpStore {
    fn records(&self) -> &[Arc<CxpRecord>] {
        &self.records
    }
}

pub(crate) fn find_record<'a>(records: &'a [Arc<CxpRecord>], name: &str) -> Option<&'a Arc<CxpRecord>> {
    // The game ran on Windows, where these names were never case sensitive.
    records
        .iter()
        .find(|record| record.material_name.eq_ignore_ascii_case(name))
}

pub fn read_cxp_file(path: &Path) -> Result<Vec<CxpRecord>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_cxp(&String::from_utf8_lossy(&bytes)))
}

pub fn parse_cxp(text: &str) -> Vec<CxpRecord> {
    let mut records = Vec::new();
    let mut tokens = tokenize(text).into_iter();
    while let Some(token) = tokens.next() {
        if !token.eq_ignore_ascii_case("material") {
            continue;
        }
        let Some(name) = tokens.next() else {
            break;
        };
        let properties = tokens
            .by_ref()
            .take_while(|token| !token.eq_ignore_ascii_case("end"))
            .collect();
        records.push(CxpRecord::new(name, properties));
    }
    records
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '"' {
            chars.next();
            let quoted: String = chars.by_ref().take_while(|&c| c != '"').collect();
            tokens.push(quoted);
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }
    tokens
}

fn find_cxp_files(root: &Path) -> Vec<PathBuf> {
    let Some(texture_dir) = find_child_dir(root, TEXTURE_DIR) else {
        return Vec::new();
    };
    WalkDir::new(texture_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CXP_EXTENSION))
        })
        .map(|entry| entry.into_path())
        .collect()
}

pub(crate) fn find_child_dir(root: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(root).ok()?;
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| entry.path())
}
