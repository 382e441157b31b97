use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::civil::Date;
use serde_json::to_string_pretty;
use thiserror::Error;

use crate::models::draft::{ContractDraft, DraftFieldError};

#[derive(Debug, Error)]
pub enum DraftFileError {
    #[error("Draft file '{0}' already exists")]
    AlreadyExists(PathBuf),

    #[error("Failed to read draft from '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse draft JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write draft to '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize draft: {0}")]
    SerializeFailed(serde_json::Error),

    #[error("{0}")]
    Field(#[from] DraftFieldError),
}

/// Writes a seeded draft to `path`. Refuses to overwrite an existing file.
pub fn init_draft(path: &Path, today: Date) -> Result<ContractDraft, DraftFileError> {
    if path.exists() {
        return Err(DraftFileError::AlreadyExists(path.to_path_buf()));
    }
    let draft = ContractDraft::seeded(today);
    save_draft(path, &draft)?;
    Ok(draft)
}

pub fn load_draft(path: &Path) -> Result<ContractDraft, DraftFileError> {
    let content = fs::read_to_string(path).map_err(|e| DraftFileError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| DraftFileError::ParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn save_draft(path: &Path, draft: &ContractDraft) -> Result<(), DraftFileError> {
    let json = to_string_pretty(draft).map_err(DraftFileError::SerializeFailed)?;
    fs::write(path, json).map_err(|e| DraftFileError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Loads the draft, applies `edit` and writes it back. Nothing is written if
/// `edit` fails.
pub fn update_draft<T>(
    path: &Path,
    edit: impl FnOnce(&mut ContractDraft) -> Result<T, DraftFieldError>,
) -> Result<T, DraftFileError> {
    let mut draft = load_draft(path)?;
    let result = edit(&mut draft)?;
    save_draft(path, &draft)?;
    tracing::debug!(path = %path.display(), "Draft updated");
    Ok(result)
}
