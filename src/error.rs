/// Crate-wide error type
///
/// Every recoverable failure is caught at the `Viewer::run` action boundary
/// and reported through the status surface; nothing here aborts the app.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to load {}: {reason}", .path.display())]
    LoadFailure { path: PathBuf, reason: String },
    #[error("Failed to save {}: {reason}", .path.display())]
    SaveFailure { path: PathBuf, reason: String },
    #[error("{0}")]
    EmptySelection(String),
    #[error("No image loaded")]
    NoImage,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ViewerError {
    pub fn load(path: &Path, reason: impl ToString) -> Self {
        ViewerError::LoadFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn save(path: &Path, reason: impl ToString) -> Self {
        ViewerError::SaveFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn empty(message: &str) -> Self {
        ViewerError::EmptySelection(message.to_string())
    }

    /// Warnings are shown with a warning prompt; everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, ViewerError::EmptySelection(_) | ViewerError::NoImage)
    }
}
