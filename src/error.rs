use std::time::Duration;

use thiserror::Error;

/// Failures of a remote repository transport. These are propagated unchanged, retrying them is
///  the caller's business.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error on {resource}: {source}")]
    Io {
        resource: String,
        source: std::io::Error,
    },
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        source: hyper::Error,
    },
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("invalid resource location {0}")]
    InvalidLocation(String),
    #[error("checksum mismatch for {resource}: expected {expected}, was {actual}")]
    ChecksumMismatch {
        resource: String,
        expected: String,
        actual: String,
    },
}

impl TransportError {
    pub fn io(resource: &str, source: std::io::Error) -> Self {
        Self::Io { resource: resource.to_string(), source }
    }
}

/// Why a `maven-metadata.xml` document could not be read
#[derive(Debug, Error)]
pub enum MetadataParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] xml::reader::Error),
    #[error("root element is <{0}>, not <metadata>")]
    UnexpectedRoot(String),
    #[error("document has no root element")]
    NoRoot,
    #[error(transparent)]
    Content(#[from] serde_xml_rs::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no transport registered for URL scheme '{scheme}' (repository '{repository}')")]
    UnsupportedScheme { scheme: String, repository: String },
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },
    #[error("'{0}' is not a snapshot version")]
    NotASnapshot(String),
    #[error("remote metadata at {location} is corrupt: {reason}")]
    MetadataCorrupt { location: String, reason: String },
    #[error("remote metadata at {location} was modified concurrently, gave up after {attempts} attempts")]
    ConcurrentModification { location: String, attempts: u32 },
    #[error("failed to serialize metadata: {0}")]
    Serialization(#[from] xml::writer::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
