use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagerError {
    #[error("source directory unavailable: {0}")]
    MissingSourceDir(String),
    #[error("metadata file invalid or unreadable: {0}")]
    InvalidMetadata(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
}
