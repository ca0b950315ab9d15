/// Tag persistence file
///
/// Layout: a JSON object keyed by tag id, each value holding the
/// rectangle as `[x, y, width, height]` in scene units plus the label.
///
/// ```json
/// { "1": { "coords": [10.0, 10.0, 50.0, 30.0], "label": "Tag-1" } }
/// ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

pub const DEFAULT_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub coords: [f64; 4],
    pub label: String,
}

/// Whole file contents; integer keys are written as JSON strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFile {
    pub tags: BTreeMap<u32, TagRecord>,
}

impl TagFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, record: TagRecord) {
        self.tags.insert(id, record);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and validate a tag file. Rectangles must be finite.
    pub fn read(path: &Path) -> Result<Self, ViewerError> {
        let json = fs::read_to_string(path).map_err(|e| ViewerError::load(path, e))?;
        let file = Self::from_json(&json).map_err(|e| ViewerError::load(path, e))?;
        for (id, record) in &file.tags {
            if record.coords.iter().any(|v| !v.is_finite()) {
                return Err(ViewerError::load(
                    path,
                    format!("tag {} has non-finite coordinates", id),
                ));
            }
        }
        Ok(file)
    }

    /// Serialize fully, then write through a sibling temp file and rename,
    /// so a failed write never leaves a truncated tag file behind.
    pub fn write(&self, path: &Path) -> Result<(), ViewerError> {
        let json = self.to_json().map_err(|e| ViewerError::save(path, e))?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let written = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(ViewerError::save(path, e));
        }
        Ok(())
    }
}

/// Append `.json` unless the path already ends with it (case-insensitive)
pub fn with_default_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(DEFAULT_EXTENSION))
        .unwrap_or(false);
    if has_ext {
        return path.to_path_buf();
    }
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(DEFAULT_EXTENSION);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TagFile {
        let mut file = TagFile::new();
        file.insert(
            1,
            TagRecord {
                coords: [10.0, 10.0, 50.0, 30.0],
                label: "Tag-1".to_string(),
            },
        );
        file.insert(
            12,
            TagRecord {
                coords: [0.5, 2.25, 4.0, 8.0],
                label: "river mouth".to_string(),
            },
        );
        file
    }

    #[test]
    fn test_json_layout_uses_string_keys() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["1"]["label"], "Tag-1");
        assert_eq!(value["12"]["coords"][1], 2.25);
    }

    #[test]
    fn test_parses_handwritten_file() {
        let json = r#"{"3": {"coords": [1, 2, 3, 4], "label": "a"}}"#;
        let file = TagFile::from_json(json).unwrap();
        assert_eq!(file.tags[&3].coords, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        let json = r#"{"abc": {"coords": [1, 2, 3, 4], "label": "a"}}"#;
        assert!(TagFile::from_json(json).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.json");
        sample().write(&path).unwrap();
        assert_eq!(TagFile::read(&path).unwrap(), sample());
        assert!(!dir.path().join("tags.json.tmp").exists());
    }

    #[test]
    fn test_read_missing_file_is_load_failure() {
        let err = TagFile::read(Path::new("/nonexistent/tags.json")).unwrap_err();
        assert!(matches!(err, ViewerError::LoadFailure { .. }));
    }

    #[test]
    fn test_write_into_missing_dir_is_save_failure() {
        let err = sample()
            .write(Path::new("/nonexistent/dir/tags.json"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::SaveFailure { .. }));
    }

    /// The temp file opens fine but the write itself fails (ENOSPC)
    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_temp_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.json");
        let tmp = dir.path().join("tags.json.tmp");
        if !Path::new("/dev/full").exists() {
            return;
        }
        std::os::unix::fs::symlink("/dev/full", &tmp).unwrap();

        let err = sample().write(&path).unwrap_err();
        assert!(matches!(err, ViewerError::SaveFailure { .. }));
        assert!(std::fs::symlink_metadata(&tmp).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(with_default_extension(Path::new("a/tags")), PathBuf::from("a/tags.json"));
        assert_eq!(with_default_extension(Path::new("tags.JSON")), PathBuf::from("tags.JSON"));
        assert_eq!(with_default_extension(Path::new("tags.txt")), PathBuf::from("tags.txt.json"));
    }
}
