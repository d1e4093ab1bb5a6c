use crate::maven::coordinates::*;

pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

fn group_path(group_id: &MavenGroupId) -> String {
    group_id.0.replace('.', "/")
}

/// `<group path>/<artifactId>`, the directory holding all versions of an artifact
pub fn artifact_dir(coordinates: &MavenCoordinates) -> String {
    format!("{}/{}", group_path(&coordinates.group_id), coordinates.artifact_id.0)
}

/// `<group path>/<artifactId>/<version>`, the directory of a single snapshot version
pub fn version_dir(coordinates: &MavenCoordinates) -> String {
    format!("{}/{}", artifact_dir(coordinates), coordinates.version)
}

/// Location of the version-level metadata document that carries the snapshot build number
pub fn snapshot_metadata_path(coordinates: &MavenCoordinates) -> String {
    format!("{}/{}", version_dir(coordinates), METADATA_FILE_NAME)
}

/// Location of the artifact-level metadata document listing all versions
pub fn artifact_metadata_path(coordinates: &MavenCoordinates) -> String {
    format!("{}/{}", artifact_dir(coordinates), METADATA_FILE_NAME)
}

/// `<artifactId>-<timestamped version>[-<classifier>].<extension>`
pub fn snapshot_file_name(artifact_id: &MavenArtifactId, timestamped_version: &str, descriptor: &ArtifactDescriptor) -> String {
    let classifier_string = match &descriptor.classifier {
        MavenClassifier::Unclassified => "".to_string(),
        MavenClassifier::Classified(c) => format!("-{}", c),
    };

    format!("{}-{}{}.{}",
            artifact_id.0,
            timestamped_version,
            classifier_string,
            descriptor.extension,
    )
}

/// Full repository path of an uploaded snapshot artifact
pub fn snapshot_artifact_path(coordinates: &MavenCoordinates, timestamped_version: &str, descriptor: &ArtifactDescriptor) -> String {
    format!(
        "{}/{}",
        version_dir(coordinates),
        snapshot_file_name(&coordinates.artifact_id, timestamped_version, descriptor),
    )
}
