use tracing::{debug, warn};

use crate::maven::coordinates::{ArtifactDescriptor, MavenCoordinates, SnapshotVersion, SNAPSHOT_MARKER};
use crate::maven::metadata::{MetadataDocument, SnapshotIdentity, SnapshotVersionEntry, SnapshotVersioning};
use crate::maven::metadata_xml::RemoteMetadata;
use crate::maven::timestamp::SnapshotTimestamp;

/// Next build number after the one recorded in an existing document.
///
/// The sequence restarts at 1 if there is no document, if it has no `versioning/snapshot`
///  section, or if its build number is missing or not a positive integer. This is a read-then-
///  increment scheme without any locking: concurrent publishers can compute the same number.
pub fn resolve_build_number(existing: Option<&RemoteMetadata>) -> u32 {
    let snapshot = existing
        .and_then(|m| m.versioning.as_ref())
        .and_then(|v| v.snapshot.as_ref());

    // the previous timestamp is informational only, a malformed one does not reset the sequence
    if let Some(previous_timestamp) = snapshot.and_then(|s| s.timestamp.as_deref()) {
        match SnapshotTimestamp::parse(previous_timestamp.trim()) {
            Some(timestamp) => debug!("previous snapshot was published at {}", timestamp),
            None => warn!("previous snapshot timestamp '{}' is not in yyyyMMdd.HHmmss format", previous_timestamp),
        }
    }

    let previous = snapshot
        .and_then(|s| s.buildNumber.as_deref())
        .and_then(|n| n.trim().parse::<u32>().ok())
        .filter(|&n| n > 0);

    match previous {
        Some(n) => {
            debug!("previous snapshot build number is {}", n);
            n.saturating_add(1)
        }
        None => {
            debug!("no usable previous snapshot build number, starting at 1");
            1
        }
    }
}

/// Replaces the `SNAPSHOT` marker with `<timestamp>-<buildNumber>`, e.g. `1.0-SNAPSHOT` becomes
///  `1.0-20230615.120000-3`
pub fn timestamped_version(version: &SnapshotVersion, identity: &SnapshotIdentity) -> String {
    version.as_str().replace(SNAPSHOT_MARKER, &identity.qualifier())
}

/// One entry per descriptor, in the descriptors' order, all sharing the resolved version
pub fn map_snapshot_versions(
    version: &SnapshotVersion,
    identity: &SnapshotIdentity,
    artifacts: &[ArtifactDescriptor],
) -> Vec<SnapshotVersionEntry> {
    let resolved_version = timestamped_version(version, identity);
    let last_updated = identity.timestamp.compact();

    artifacts.iter()
        .map(|a| SnapshotVersionEntry {
            classifier: a.classifier.clone(),
            extension: a.extension.clone(),
            resolved_version: resolved_version.clone(),
            last_updated: last_updated.clone(),
        })
        .collect()
}

/// Assembles the complete snapshot metadata document in one step
pub fn compose_snapshot_metadata(
    coordinates: &MavenCoordinates,
    identity: SnapshotIdentity,
    artifacts: &[ArtifactDescriptor],
) -> MetadataDocument {
    let entries = map_snapshot_versions(&coordinates.version, &identity, artifacts);
    let last_updated = identity.timestamp.compact();

    MetadataDocument {
        group_id: coordinates.group_id.clone(),
        artifact_id: coordinates.artifact_id.clone(),
        version: coordinates.version.clone(),
        versioning: SnapshotVersioning {
            snapshot: identity,
            last_updated,
            entries,
        },
    }
}

/// The whole reconciliation for one publish attempt: resolve the build number from whatever was
///  read, stamp it with the build time and fan it out over the publication's artifacts
pub fn reconcile_snapshot(
    coordinates: &MavenCoordinates,
    existing: Option<&RemoteMetadata>,
    timestamp: SnapshotTimestamp,
    artifacts: &[ArtifactDescriptor],
) -> MetadataDocument {
    let identity = SnapshotIdentity {
        timestamp,
        build_number: resolve_build_number(existing),
    };
    compose_snapshot_metadata(coordinates, identity, artifacts)
}
