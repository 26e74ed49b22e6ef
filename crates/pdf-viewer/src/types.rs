use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by a rendering engine adapter
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to open document: {0}")]
    Open(#[source] EngineError),
    #[error("Failed to fetch page {page}: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: EngineError,
    },
    #[error("2d context not supported")]
    Capability,
    #[error("Failed to render page: {0}")]
    RenderSubmit(#[source] EngineError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Render worker stopped")]
    WorkerStopped,
}

pub type Result<T> = std::result::Result<T, ViewerError>;

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DocumentSource {
    /// A document on the local filesystem
    Path(PathBuf),
    /// An in-memory document; never written to config files
    #[cfg_attr(feature = "serde", serde(skip))]
    Bytes(Arc<[u8]>),
}

impl DocumentSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        DocumentSource::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        DocumentSource::Bytes(bytes.into())
    }

    /// Short human-readable label for logs
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }

    /// Read the whole document into memory
    pub async fn read_bytes(&self) -> std::result::Result<Arc<[u8]>, EngineError> {
        match self {
            DocumentSource::Path(path) => Ok(tokio::fs::read(path).await?.into()),
            DocumentSource::Bytes(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::Path(path)
    }
}

impl From<&str> for DocumentSource {
    fn from(path: &str) -> Self {
        DocumentSource::Path(PathBuf::from(path))
    }
}

/// Read-only view of the controller state handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ViewSnapshot {
    pub current_page: u32,
    pub total_pages: u32,
    pub zoom_percent: u32,
    pub rotation_degrees: i32,
    pub loading: bool,
    pub last_error: String,
}
