//! Error types for the resolution pipeline with context and recovery information

use std::path::PathBuf;
use thiserror::Error;

use crate::resolver::keyfile::KeyFileError;

/// Errors produced while resolving an AppID to manifests and keys
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Transport-level HTTP failure
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP request to '{url}' returned status {status}")]
    HttpStatus {
        url: String,
        status: u16,
    },

    /// A JSON body could not be decoded into the expected shape
    #[error("Malformed response from '{url}'")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The branch response did not carry a tree locator
    #[error("Response from '{url}' has no tree locator")]
    MissingTreeUrl {
        url: String,
    },

    /// A listing entry has neither inline content nor a blob locator
    #[error("Entry '{path}' has no inline content and no content locator")]
    MissingContentUrl {
        path: String,
    },

    /// base64 content that failed to decode
    #[error("Malformed base64 content")]
    InvalidBase64 {
        #[source]
        source: base64::DecodeError,
    },

    /// base64 encoding declared on empty content
    #[error("Malformed response: encoded empty content")]
    EmptyEncodedContent,

    /// Content the API refuses to inline (files above 1 MB)
    #[error("Unsupported content encoding: none (content too large to be served inline)")]
    ContentTooLarge,

    /// Any other encoding tag
    #[error("Unsupported content encoding: {encoding}")]
    UnsupportedEncoding {
        encoding: String,
    },

    /// The key file was malformed
    #[error("Key file is invalid: {0}")]
    KeyFile(#[from] KeyFileError),

    /// The repository has no branch for the AppID
    #[error("Branch '{branch}' not found in repository '{repo}'")]
    BranchNotFound {
        repo: String,
        branch: String,
    },

    /// Generic not-found terminal condition
    #[error("{what} not found")]
    NotFound {
        what: String,
    },

    /// Search term was empty
    #[error("Game name or AppID is empty")]
    EmptyQuery,

    /// Selection index outside the offered range
    #[error("Index {index} out of range (expected 0-{max})")]
    SelectionOutOfRange {
        index: usize,
        max: usize,
    },

    /// Entry path that would escape the destination directory
    #[error("Refusing to write entry with unsafe path '{path}'")]
    UnsafePath {
        path: String,
    },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}': {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// One repository attempt failed
    #[error("Repository '{repo}' failed: {source}")]
    Repository {
        repo: String,
        #[source]
        source: Box<ResolveError>,
    },

    /// Every candidate failed; the last element is the terminal not-found
    #[error("{}", join_failures(.failures))]
    Exhausted {
        failures: Vec<ResolveError>,
    },
}

fn join_failures(failures: &[ResolveError]) -> String {
    failures
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Read,
    Write,
    Metadata,
    Move,
    CreateDir,
    RemoveDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Metadata => write!(f, "reading metadata"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::RemoveDir => write!(f, "removing directory"),
        }
    }
}

/// Coarse classification of a [`ResolveError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Decode,
    Parse,
    NotFound,
    Validation,
    FileSystem,
    Configuration,
}

pub type Result<T> = std::result::Result<T, ResolveError>;

impl ResolveError {
    /// Classify the error; wrapped repository errors report their cause
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::HttpRequest { .. } | ResolveError::HttpStatus { .. } => ErrorKind::Network,
            ResolveError::MalformedResponse { .. }
            | ResolveError::MissingTreeUrl { .. }
            | ResolveError::MissingContentUrl { .. }
            | ResolveError::InvalidBase64 { .. }
            | ResolveError::EmptyEncodedContent
            | ResolveError::ContentTooLarge
            | ResolveError::UnsupportedEncoding { .. } => ErrorKind::Decode,
            ResolveError::KeyFile(_) => ErrorKind::Parse,
            ResolveError::BranchNotFound { .. }
            | ResolveError::NotFound { .. }
            | ResolveError::Exhausted { .. } => ErrorKind::NotFound,
            ResolveError::EmptyQuery
            | ResolveError::SelectionOutOfRange { .. }
            | ResolveError::UnsafePath { .. } => ErrorKind::Validation,
            ResolveError::FileSystem { .. } => ErrorKind::FileSystem,
            ResolveError::Configuration { .. } => ErrorKind::Configuration,
            ResolveError::Repository { source, .. } => source.kind(),
        }
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ResolveError::HttpStatus { status: 403, .. } | ResolveError::HttpStatus { status: 429, .. } => {
                Some("The API rate limit was probably hit; wait a while and run again")
            }
            ResolveError::ContentTooLarge => {
                Some("The file exceeds the inline size limit of the contents API")
            }
            ResolveError::Exhausted { .. } => {
                Some("No configured repository carries this AppID; try another repository list")
            }
            ResolveError::Configuration { .. } => Some("Check the MANIFEST_* environment variables"),
            _ => None,
        }
    }

    /// Wrap a failure with the repository it came from
    pub fn in_repository<S: Into<String>>(self, repo: S) -> Self {
        ResolveError::Repository {
            repo: repo.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        ResolveError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string()).unwrap_or_else(|| "<unknown>".to_string());
        ResolveError::HttpRequest { url, source: error }
    }
}

impl From<url::ParseError> for ResolveError {
    fn from(error: url::ParseError) -> Self {
        ResolveError::Configuration {
            message: format!("invalid URL: {}", error),
            field: None,
        }
    }
}
