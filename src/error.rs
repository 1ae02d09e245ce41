use thiserror::Error;

/// The template package could not be opened or written back.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("invalid document package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Placeholder substitution failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template part {part} is missing or not UTF-8")]
    MissingPart { part: String },
    #[error("render data must be a JSON object")]
    InvalidData,
    #[error("render data could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RenderError {
    pub fn missing_part(part: impl Into<String>) -> Self {
        Self::MissingPart { part: part.into() }
    }
}

/// Failure surfaced to whoever asked for the document.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
