use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Slot;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("category slot {slot} is bound more than once")]
    DuplicateCategorySlot { slot: Slot },
    #[error("category label '{category}' is used by more than one slot")]
    DuplicateCategoryLabel { category: String },
    #[error("category '{category}' binds issue slot {slot} more than once")]
    DuplicateIssueSlot { category: String, slot: Slot },
    #[error("category '{category}' binds an issue to the reserved return slot 0")]
    ReservedSlot { category: String },
    #[error("category '{category}' has no issues")]
    EmptyCategory { category: String },
    #[error("blank label at category slot {slot}")]
    BlankLabel { slot: Slot },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
