use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cxp::{CxpStore, find_child_dir};
use crate::error::LoadError;
use crate::geometry::ModelKind;

const DATA_DIR: &str = "data";
const MODS_DIR: &str = "mods";

/// Game data directory for a model, plus the mod data directory when the
/// model belongs to a mod (`<install>/mods/<name>/data/...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_root: PathBuf,
    pub mod_root: Option<PathBuf>,
}

impl DataPaths {
    /// Walks up from `model_path` to the nearest `data` directory. Returns
    /// `None` for models that do not live below one.
    pub fn for_model(model_path: &Path) -> Option<Self> {
        let data_dir = model_path
            .ancestors()
            .skip(1)
            .find(|dir| is_named(dir, DATA_DIR))?;

        let install_dir = data_dir
            .parent()
            .and_then(Path::parent)
            .filter(|dir| is_named(dir, MODS_DIR))
            .and_then(Path::parent);
        if let Some(game_data) = install_dir.and_then(|dir| find_child_dir(dir, DATA_DIR)) {
            return Some(DataPaths {
                data_root: game_data,
                mod_root: Some(data_dir.to_path_buf()),
            });
        }

        Some(DataPaths {
            data_root: data_dir.to_path_buf(),
            mod_root: None,
        })
    }

    pub fn load_cxp(&self) -> Result<CxpStore, LoadError> {
        CxpStore::load(&self.data_root, self.mod_root.as_deref())
    }
}

fn is_named(dir: &Path, name: &str) -> bool {
    dir.file_name()
        .and_then(|file_name| file_name.to_str())
        .is_some_and(|file_name| file_name.eq_ignore_ascii_case(name))
}

/// Every file below `root` whose extension matches `kind`, ignoring case,
/// in sorted order.
pub fn gather_model_files(root: &Path, kind: ModelKind) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| ModelKind::from_path(entry.path()) == Some(kind))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
