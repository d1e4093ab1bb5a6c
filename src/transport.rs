//! Read/write access to a remote repository by resource name, independent of the protocol.

pub mod file_transport;
pub mod http_transport;
pub mod in_memory_transport;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::error::{PublishError, TransportError};
use crate::transport::file_transport::FileRepository;
use crate::transport::http_transport::HttpRepository;

/// Credentials configured for a repository
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Authentication {
    #[default]
    None,
    Basic { username: String, password: String },
}

/// A resource as read from a remote repository. The `etag` identifies this particular content,
///  if the repository supports conditional writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteResource {
    pub content: Bytes,
    pub etag: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WritePrecondition {
    Unconditional,
    /// only write if there is no resource yet
    IfAbsent,
    /// only write if the resource is unchanged since it was read with this etag
    IfMatch(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    PreconditionFailed,
}

/// Resource names are relative paths like `org/example/widget/maven-metadata.xml`, resolved
///  against the repository's base URL.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// `Ok(None)` if the resource does not exist
    async fn read(&self, name: &str) -> Result<Option<RemoteResource>, TransportError>;

    async fn write(&self, name: &str, content: Bytes, precondition: WritePrecondition) -> Result<WriteOutcome, TransportError>;
}

/// Everything needed to connect to a repository
#[derive(Clone, Debug)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub url: Url,
    pub authentication: Authentication,
    pub timeout: Duration,
}

pub trait TransportFactory: Send + Sync {
    /// `scheme` is expected in lower case
    fn create_transport(&self, scheme: &str, repository: &RepositoryDescriptor) -> Result<Arc<dyn RemoteRepository>, PublishError>;
}

/// Knows the `http`, `https` and `file` schemes
#[derive(Default)]
pub struct DefaultTransportFactory {}

impl TransportFactory for DefaultTransportFactory {
    fn create_transport(&self, scheme: &str, repository: &RepositoryDescriptor) -> Result<Arc<dyn RemoteRepository>, PublishError> {
        debug!("creating {} transport for repository '{}'", scheme, repository.name);

        match scheme {
            "http" | "https" => Ok(Arc::new(HttpRepository::new(
                repository.url.clone(),
                repository.authentication.clone(),
                repository.timeout,
            )?)),
            "file" => {
                let root = repository.url.to_file_path()
                    .map_err(|_| PublishError::InvalidRepositoryUrl {
                        url: repository.url.to_string(),
                        reason: "not a local file path".to_string(),
                    })?;
                Ok(Arc::new(FileRepository::new(root)))
            }
            other => Err(PublishError::UnsupportedScheme {
                scheme: other.to_string(),
                repository: repository.name.clone(),
            }),
        }
    }
}
