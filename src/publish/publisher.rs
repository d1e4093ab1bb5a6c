use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::maven::coordinates::{ArtifactDescriptor, MavenCoordinates};
use crate::maven::metadata::{ArtifactMetadataDocument, SnapshotIdentity};
use crate::maven::metadata_xml::{write_artifact_metadata, write_snapshot_metadata};
use crate::maven::paths::{artifact_metadata_path, snapshot_artifact_path, snapshot_metadata_path};
use crate::maven::snapshot::{reconcile_snapshot, timestamped_version};
use crate::maven::timestamp::{BuildTimeProvider, SnapshotTimestamp};
use crate::publish::reader::{read_existing_metadata, CorruptMetadataPolicy};
use crate::publish::upload::upload_with_checksums;
use crate::transport::{RemoteRepository, RepositoryDescriptor, TransportFactory, WriteOutcome, WritePrecondition};

/// How the snapshot metadata write deals with concurrent publishers of the same coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconciliationStrategy {
    /// read, increment and write unconditionally. Two publishers reading the same document
    ///  produce the same build number.
    Optimistic,
    /// write only if the document is unchanged since it was read, and redo the whole publish
    ///  with a fresh read if it was not
    ConditionalWrite { max_attempts: u32 },
}
impl Default for ReconciliationStrategy {
    fn default() -> Self {
        ReconciliationStrategy::Optimistic
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PublishOptions {
    pub strategy: ReconciliationStrategy,
    pub on_corrupt_metadata: CorruptMetadataPolicy,
}

#[derive(Clone, Debug)]
pub struct PublicationArtifact {
    pub descriptor: ArtifactDescriptor,
    pub content: Bytes,
}

#[derive(Clone, Debug)]
pub struct Publication {
    pub coordinates: MavenCoordinates,
    pub artifacts: Vec<PublicationArtifact>,
}
impl Publication {
    pub fn descriptors(&self) -> Vec<ArtifactDescriptor> {
        self.artifacts.iter()
            .map(|a| a.descriptor.clone())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishReport {
    pub identity: SnapshotIdentity,
    pub timestamped_version: String,
    /// every resource written, excluding checksum files, in write order
    pub uploaded: Vec<String>,
    pub attempts: u32,
}

/// Publishes snapshot publications to remote repositories, assigning each publish the next
///  build number recorded in the repository's metadata.
pub struct MavenRemotePublisher {
    transport_factory: Arc<dyn TransportFactory>,
    time_provider: Arc<dyn BuildTimeProvider>,
    options: PublishOptions,
}

impl MavenRemotePublisher {
    pub fn new(transport_factory: Arc<dyn TransportFactory>, time_provider: Arc<dyn BuildTimeProvider>, options: PublishOptions) -> MavenRemotePublisher {
        MavenRemotePublisher {
            transport_factory,
            time_provider,
            options,
        }
    }

    pub async fn publish(&self, publication: &Publication, repository: &RepositoryDescriptor) -> Result<PublishReport, PublishError> {
        info!("Publishing to repository '{}' ({})", repository.name, repository.url);

        let scheme = repository.url.scheme().to_lowercase();
        let remote = self.transport_factory.create_transport(&scheme, repository)?;

        self.publish_to(publication, remote.as_ref()).await
    }

    /// Runs the publish against an already selected transport
    pub async fn publish_to(&self, publication: &Publication, remote: &dyn RemoteRepository) -> Result<PublishReport, PublishError> {
        let coordinates = &publication.coordinates;
        let location = snapshot_metadata_path(coordinates);
        let timestamp = SnapshotTimestamp::from_provider(self.time_provider.as_ref());

        let max_attempts = match self.options.strategy {
            ReconciliationStrategy::Optimistic => 1,
            ReconciliationStrategy::ConditionalWrite { max_attempts } => max_attempts.max(1),
        };

        for attempt in 1..=max_attempts {
            debug!("publishing {} (attempt {} of {})", coordinates, attempt, max_attempts);

            if let Some(report) = self.try_publish(publication, remote, &location, &timestamp, attempt).await? {
                return Ok(report);
            }
            warn!("concurrent publish of {} detected at {}, retrying", coordinates, location);
        }

        Err(PublishError::ConcurrentModification {
            location,
            attempts: max_attempts,
        })
    }

    /// `Ok(None)` if a conditional write was rejected: the snapshot metadata was modified
    ///  concurrently, or one of the timestamped artifacts already exists
    async fn try_publish(
        &self,
        publication: &Publication,
        remote: &dyn RemoteRepository,
        location: &str,
        timestamp: &SnapshotTimestamp,
        attempt: u32,
    ) -> Result<Option<PublishReport>, PublishError> {
        let coordinates = &publication.coordinates;

        let existing = read_existing_metadata(remote, location).await?.for_artifact(coordinates);
        let (precondition, artifact_precondition) = match self.options.strategy {
            ReconciliationStrategy::Optimistic => (WritePrecondition::Unconditional, WritePrecondition::Unconditional),
            ReconciliationStrategy::ConditionalWrite { .. } => (existing.write_precondition(), WritePrecondition::IfAbsent),
        };
        let usable = self.options.on_corrupt_metadata.usable_document(&existing, location)?;

        let document = reconcile_snapshot(coordinates, usable, timestamp.clone(), &publication.descriptors());
        let identity = document.versioning.snapshot.clone();
        let timestamped = timestamped_version(&coordinates.version, &identity);
        debug!("resolved {} to {}", coordinates, timestamped);

        // both documents are prepared before the first upload
        let metadata_xml = write_snapshot_metadata(&document)?;
        let artifact_location = artifact_metadata_path(coordinates);
        let artifact_metadata_xml = self.prepare_artifact_metadata(remote, coordinates, &artifact_location, timestamp).await?;

        let mut uploaded = Vec::new();
        for artifact in &publication.artifacts {
            let path = snapshot_artifact_path(coordinates, &timestamped, &artifact.descriptor);
            // a timestamped file that already exists belongs to a concurrent publish of the same build
            if upload_with_checksums(remote, &path, artifact.content.clone(), artifact_precondition.clone()).await? == WriteOutcome::PreconditionFailed {
                debug!("{} was published concurrently", path);
                return Ok(None);
            }
            uploaded.push(path);
        }

        match upload_with_checksums(remote, location, Bytes::from(metadata_xml), precondition).await? {
            WriteOutcome::PreconditionFailed => return Ok(None),
            WriteOutcome::Written => uploaded.push(location.to_string()),
        }

        upload_with_checksums(remote, &artifact_location, Bytes::from(artifact_metadata_xml), WritePrecondition::Unconditional).await?;
        uploaded.push(artifact_location);

        Ok(Some(PublishReport {
            identity,
            timestamped_version: timestamped,
            uploaded,
            attempts: attempt,
        }))
    }

    /// The artifact-level metadata with the published version recorded in it
    async fn prepare_artifact_metadata(
        &self,
        remote: &dyn RemoteRepository,
        coordinates: &MavenCoordinates,
        location: &str,
        timestamp: &SnapshotTimestamp,
    ) -> Result<Vec<u8>, PublishError> {
        let existing = read_existing_metadata(remote, location).await?.for_artifact(coordinates);
        let usable = self.options.on_corrupt_metadata.usable_document(&existing, location)?;

        let document = ArtifactMetadataDocument::after_publish(usable, coordinates, timestamp);
        write_artifact_metadata(&document)
    }
}
