//! Immutable values of the `maven-metadata.xml` documents this crate writes. Documents read from a
//!  remote repository use the lenient model in [crate::maven::metadata_xml] instead; a written
//!  document is always constructed fresh and never derived by mutating a read one.

use crate::maven::coordinates::{MavenArtifactId, MavenClassifier, MavenCoordinates, MavenGroupId, SnapshotVersion};
use crate::maven::metadata_xml::RemoteMetadata;
use crate::maven::timestamp::SnapshotTimestamp;

pub const MODEL_VERSION: &str = "1.1.0";

/// The resolved snapshot qualifier of one publish: created once, shared by every artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotIdentity {
    pub timestamp: SnapshotTimestamp,
    pub build_number: u32, // >= 1
}
impl SnapshotIdentity {
    /// `<timestamp>-<buildNumber>`, the replacement for the `SNAPSHOT` marker
    pub fn qualifier(&self) -> String {
        format!("{}-{}", self.timestamp, self.build_number)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotVersionEntry {
    pub classifier: MavenClassifier,
    pub extension: String,
    pub resolved_version: String,
    pub last_updated: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotVersioning {
    pub snapshot: SnapshotIdentity,
    pub last_updated: String,
    pub entries: Vec<SnapshotVersionEntry>,
}

/// The version-level metadata document, stored next to the artifacts of a snapshot version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataDocument {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
    pub version: SnapshotVersion,
    pub versioning: SnapshotVersioning,
}
impl MetadataDocument {
    pub fn model_version(&self) -> &'static str {
        MODEL_VERSION
    }
}

/// The artifact-level metadata document listing every version published for an artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactMetadataDocument {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
    pub latest: String,
    pub versions: Vec<String>,
    pub last_updated: String,
}
impl ArtifactMetadataDocument {
    /// Builds the document after publishing `coordinates`: versions listed by an existing document
    ///  are kept in their order, the published version is appended if it is new.
    pub fn after_publish(
        existing: Option<&RemoteMetadata>,
        coordinates: &MavenCoordinates,
        timestamp: &SnapshotTimestamp,
    ) -> ArtifactMetadataDocument {
        let published = coordinates.version.as_str();

        let mut versions: Vec<String> = existing
            .and_then(|m| m.versioning.as_ref())
            .and_then(|v| v.versions.as_ref())
            .map(|v| v.version.clone())
            .unwrap_or_default();
        if !versions.iter().any(|v| v == published) {
            versions.push(published.to_string());
        }

        ArtifactMetadataDocument {
            group_id: coordinates.group_id.clone(),
            artifact_id: coordinates.artifact_id.clone(),
            latest: published.to_string(),
            versions,
            last_updated: timestamp.compact(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::maven::metadata_xml::parse_remote_metadata;

    fn coordinates() -> MavenCoordinates {
        MavenCoordinates::new("org.example", "widget", "1.1-SNAPSHOT").unwrap()
    }

    #[test]
    fn test_artifact_metadata_without_existing() {
        let timestamp = SnapshotTimestamp::parse("20230615.120000").unwrap();
        let doc = ArtifactMetadataDocument::after_publish(None, &coordinates(), &timestamp);

        assert_eq!(doc.versions, vec!["1.1-SNAPSHOT".to_string()]);
        assert_eq!(doc.latest, "1.1-SNAPSHOT");
        assert_eq!(doc.last_updated, "20230615120000");
    }

    #[test]
    fn test_artifact_metadata_appends_new_version() {
        let existing = parse_remote_metadata(r#"<metadata>
            <groupId>org.example</groupId>
            <artifactId>widget</artifactId>
            <versioning>
                <latest>1.0-SNAPSHOT</latest>
                <versions><version>0.9</version><version>1.0-SNAPSHOT</version></versions>
                <lastUpdated>20230101000000</lastUpdated>
            </versioning>
        </metadata>"#).unwrap();
        let timestamp = SnapshotTimestamp::parse("20230615.120000").unwrap();

        let doc = ArtifactMetadataDocument::after_publish(Some(&existing), &coordinates(), &timestamp);
        assert_eq!(doc.versions, vec!["0.9", "1.0-SNAPSHOT", "1.1-SNAPSHOT"]);
        assert_eq!(doc.latest, "1.1-SNAPSHOT");
    }

    #[test]
    fn test_artifact_metadata_does_not_duplicate() {
        let existing = parse_remote_metadata(r#"<metadata>
            <versioning>
                <versions><version>1.1-SNAPSHOT</version><version>0.9</version></versions>
            </versioning>
        </metadata>"#).unwrap();
        let timestamp = SnapshotTimestamp::parse("20230615.120000").unwrap();

        let doc = ArtifactMetadataDocument::after_publish(Some(&existing), &coordinates(), &timestamp);
        assert_eq!(doc.versions, vec!["1.1-SNAPSHOT", "0.9"]);
    }
}
