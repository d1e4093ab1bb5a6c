use tracing::{debug, warn};

use crate::error::{PublishError, TransportError};
use crate::maven::coordinates::MavenCoordinates;
use crate::maven::metadata_xml::{parse_remote_metadata, RemoteMetadata};
use crate::transport::{RemoteRepository, WritePrecondition};

/// What was found at a metadata location. Absence is the normal state before the first publish
///  and is distinct from a document that exists but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingMetadata {
    Absent,
    Corrupt {
        reason: String,
        etag: Option<String>,
    },
    Present {
        document: RemoteMetadata,
        etag: Option<String>,
    },
}
impl ExistingMetadata {
    /// The precondition under which a replacement may be written without losing a concurrent update
    pub fn write_precondition(&self) -> WritePrecondition {
        match self {
            ExistingMetadata::Absent => WritePrecondition::IfAbsent,
            ExistingMetadata::Corrupt { etag: Some(etag), .. } |
            ExistingMetadata::Present { etag: Some(etag), .. } => WritePrecondition::IfMatch(etag.clone()),
            _ => {
                debug!("remote repository provides no etag, falling back to an unconditional write");
                WritePrecondition::Unconditional
            }
        }
    }

    /// A present document whose `groupId` or `artifactId` contradicts `coordinates` is corrupt.
    ///  Missing ids are accepted.
    pub fn for_artifact(self, coordinates: &MavenCoordinates) -> ExistingMetadata {
        let (document, etag) = match self {
            ExistingMetadata::Present { document, etag } => (document, etag),
            other => return other,
        };

        let contradiction = |found: &Option<String>, expected: &str, element: &str| {
            found.as_deref()
                .filter(|found| found.trim() != expected)
                .map(|found| format!("{} '{}' does not match '{}'", element, found, expected))
        };
        let mismatch = contradiction(&document.groupId, &coordinates.group_id.0, "groupId")
            .or_else(|| contradiction(&document.artifactId, &coordinates.artifact_id.0, "artifactId"));

        match mismatch {
            Some(reason) => ExistingMetadata::Corrupt { reason, etag },
            None => ExistingMetadata::Present { document, etag },
        }
    }
}

/// Reads and parses the metadata document at `location`. Transport failures are propagated,
///  content that fails its checksum or does not parse is reported as corrupt.
pub async fn read_existing_metadata(repository: &dyn RemoteRepository, location: &str) -> Result<ExistingMetadata, TransportError> {
    let resource = match repository.read(location).await {
        Ok(Some(resource)) => resource,
        Ok(None) => {
            debug!("no metadata at {}", location);
            return Ok(ExistingMetadata::Absent);
        }
        Err(e @ TransportError::ChecksumMismatch { .. }) => {
            return Ok(ExistingMetadata::Corrupt { reason: e.to_string(), etag: None });
        }
        Err(e) => return Err(e),
    };

    let text = match std::str::from_utf8(&resource.content) {
        Ok(text) => text,
        Err(e) => {
            return Ok(ExistingMetadata::Corrupt { reason: format!("not valid UTF-8: {}", e), etag: resource.etag });
        }
    };

    match parse_remote_metadata(text) {
        Ok(document) => Ok(ExistingMetadata::Present { document, etag: resource.etag }),
        Err(e) => Ok(ExistingMetadata::Corrupt { reason: e.to_string(), etag: resource.etag }),
    }
}

/// How to proceed when the existing metadata document is corrupt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorruptMetadataPolicy {
    /// abort the publish, nothing is written
    #[default]
    Fail,
    /// proceed as if there was no document, restarting the build number sequence at 1
    TreatAsAbsent,
}
impl CorruptMetadataPolicy {
    /// The document to derive the next state from, or an error if the policy forbids going on
    pub fn usable_document<'a>(&self, existing: &'a ExistingMetadata, location: &str) -> Result<Option<&'a RemoteMetadata>, PublishError> {
        match existing {
            ExistingMetadata::Absent => Ok(None),
            ExistingMetadata::Present { document, .. } => Ok(Some(document)),
            ExistingMetadata::Corrupt { reason, .. } => match self {
                CorruptMetadataPolicy::Fail => Err(PublishError::MetadataCorrupt {
                    location: location.to_string(),
                    reason: reason.clone(),
                }),
                CorruptMetadataPolicy::TreatAsAbsent => {
                    warn!("ignoring corrupt metadata at {}: {}", location, reason);
                    Ok(None)
                }
            },
        }
    }
}
