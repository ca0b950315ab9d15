/// Session activity log
///
/// Every user-visible operation on the current image is recorded with:
/// - Sequential number
/// - Timestamp
/// - Action name
/// - Detail (file, tag, parameter values)
///
/// The log can be exported as human-readable text or JSON; the format is
/// picked from the target file's extension.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ViewerError;

/// A single recorded action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// 1-based position in the session
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub action: String,
    pub detail: String,
}

impl ActivityEntry {
    pub fn to_text(&self) -> String {
        format!(
            "[{:03}] {} | {} | {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            if self.detail.is_empty() {
                "-"
            } else {
                self.detail.as_str()
            }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub source_file: String,
    pub software_version: String,
    pub entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            source_file: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    /// Fresh session for a newly opened image
    pub fn restart(&mut self, source: &str) {
        *self = Self::new();
        self.source_file = source.to_string();
    }

    pub fn add_entry(&mut self, action: &str, detail: &str) {
        let seq = self.entries.len() + 1;
        self.entries.push(ActivityEntry {
            sequence: seq,
            timestamp: Local::now(),
            action: action.to_string(),
            detail: detail.to_string(),
        });
        log::info!("[ACT {:03}] {} | {}", seq, action, detail);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ActivityEntry> {
        self.entries.last()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str("  TIF Viewer Session Log\n");
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("  Source:      {}\n", self.source_file));
        out.push_str(&format!("  Software:    tif_viewer v{}\n", self.software_version));
        out.push_str(&format!("  Actions:     {}\n", self.entries.len()));
        out.push_str("───────────────────────────────────────────────────────────────\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write as JSON when `path` ends in `.json`, as text otherwise
    pub fn export(&self, path: &Path) -> Result<(), ViewerError> {
        let is_json = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let body = if is_json {
            self.to_json().map_err(|e| ViewerError::save(path, e))?
        } else {
            self.to_text()
        };
        std::fs::write(path, body).map_err(|e| ViewerError::save(path, e))?;
        log::info!("Session log exported to {}", path.display());
        Ok(())
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_numbered() {
        let mut log = ActivityLog::new();
        assert!(log.is_empty());
        log.add_entry("Open", "scan.tif");
        log.add_entry("Create tag", "Tag-1");
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[1].sequence, 2);
        assert_eq!(log.last().unwrap().action, "Create tag");
    }

    #[test]
    fn test_restart_starts_new_session() {
        let mut log = ActivityLog::new();
        let first = log.session_id.clone();
        log.add_entry("Open", "a.tif");
        log.restart("b.tif");
        assert!(log.is_empty());
        assert_eq!(log.source_file, "b.tif");
        assert_ne!(log.session_id, first);
    }

    #[test]
    fn test_text_export() {
        let mut log = ActivityLog::new();
        log.restart("scene.tif");
        log.add_entry("Reset adjustment", "");
        let text = log.to_text();
        assert!(text.contains("scene.tif"));
        assert!(text.contains("[001]"));
        assert!(text.contains("Reset adjustment | -"));
    }

    #[test]
    fn test_export_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ActivityLog::new();
        log.add_entry("Save tags", "tags.json");

        let json_path = dir.path().join("session.JSON");
        log.export(&json_path).unwrap();
        let parsed: ActivityLog =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.session_id, log.session_id);

        let text_path = dir.path().join("session.txt");
        log.export(&text_path).unwrap();
        assert!(std::fs::read_to_string(&text_path)
            .unwrap()
            .contains("Save tags"));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new();
        let err = log.export(&dir.path().join("nope").join("log.txt")).unwrap_err();
        assert!(matches!(err, ViewerError::SaveFailure { .. }));
    }
}
