#[derive(Debug, thiserror::Error)]
pub enum MinutesError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("vault directory not found: {path}", path = .0.display())]
    VaultNotFound(std::path::PathBuf),
    #[error("document not found: {path}", path = .0.display())]
    DocumentNotFound(std::path::PathBuf),
    #[error("failed to create directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to rename file: {0}")]
    FileRename(std::io::Error),
    #[error(
        "note already exists (path: {path})",
        path = .0.display()
    )]
    NoteExists(std::path::PathBuf),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("invalid text: {0}")]
    Text(#[from] minutes_types::TextError),

    #[error("language model request failed: {0}")]
    ModelRequest(reqwest::Error),
    #[error("language model returned an unusable response: {0}")]
    ModelResponse(String),
}

pub type MinutesResult<T> = std::result::Result<T, MinutesError>;
