use std::fmt::{Display, Formatter};

use crate::error::PublishError;

/// The literal qualifier that marks a version as a snapshot
pub const SNAPSHOT_MARKER: &str = "SNAPSHOT";

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MavenArtifactId(pub String);

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MavenGroupId(pub String);

/// A version string ending in the literal `SNAPSHOT` marker, e.g. `1.0-SNAPSHOT`. Non-snapshot
///  versions never reach the snapshot publisher.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SnapshotVersion(String);
impl SnapshotVersion {
    pub fn parse(version: &str) -> Result<SnapshotVersion, PublishError> {
        if version.ends_with(SNAPSHOT_MARKER) {
            Ok(SnapshotVersion(version.to_string()))
        }
        else {
            Err(PublishError::NotASnapshot(version.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for SnapshotVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The logical identity of the module being published. Immutable for the duration of a publish.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MavenCoordinates {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
    pub version: SnapshotVersion,
}
impl MavenCoordinates {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Result<MavenCoordinates, PublishError> {
        Ok(MavenCoordinates {
            group_id: MavenGroupId(group_id.to_string()),
            artifact_id: MavenArtifactId(artifact_id.to_string()),
            version: SnapshotVersion::parse(version)?,
        })
    }
}
impl Display for MavenCoordinates {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id.0, self.artifact_id.0, self.version)
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum MavenClassifier {
    Unclassified,
    Classified(String),
}
impl MavenClassifier {
    pub fn as_option(&self) -> Option<&str> {
        match self {
            MavenClassifier::Unclassified => None,
            MavenClassifier::Classified(c) => Some(c.as_str()),
        }
    }
}
impl From<Option<String>> for MavenClassifier {
    fn from(value: Option<String>) -> Self {
        match value {
            None => MavenClassifier::Unclassified,
            Some(c) => MavenClassifier::Classified(c),
        }
    }
}

/// Identifies one physical file within a publication
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ArtifactDescriptor {
    pub classifier: MavenClassifier,
    pub extension: String, // without leading '.', e.g. "jar"
}
impl ArtifactDescriptor {
    pub fn new(classifier: Option<&str>, extension: &str) -> ArtifactDescriptor {
        ArtifactDescriptor {
            classifier: classifier.map(|c| c.to_string()).into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }
}
