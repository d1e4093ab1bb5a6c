use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use url::Url;

use snapshot_vault::maven::coordinates::{ArtifactDescriptor, MavenCoordinates};
use snapshot_vault::maven::metadata_xml::parse_remote_metadata;
use snapshot_vault::maven::timestamp::BuildCommencedTime;
use snapshot_vault::publish::publisher::{MavenRemotePublisher, Publication, PublicationArtifact, PublishOptions, ReconciliationStrategy};
use snapshot_vault::transport::in_memory_transport::InMemoryRepository;
use snapshot_vault::transport::{Authentication, DefaultTransportFactory, RepositoryDescriptor};

fn publication() -> Publication {
    Publication {
        coordinates: MavenCoordinates::new("org.example", "widget", "2.1-SNAPSHOT").unwrap(),
        artifacts: vec![
            PublicationArtifact { descriptor: ArtifactDescriptor::new(None, "pom"), content: Bytes::from_static(b"<project/>") },
            PublicationArtifact { descriptor: ArtifactDescriptor::new(None, "jar"), content: Bytes::from_static(b"classes") },
            PublicationArtifact { descriptor: ArtifactDescriptor::new(Some("javadoc"), "jar"), content: Bytes::from_static(b"docs") },
        ],
    }
}

fn publisher_at(hour: u32, options: PublishOptions) -> MavenRemotePublisher {
    let time = BuildCommencedTime::at(Utc.with_ymd_and_hms(2023, 6, 15, hour, 0, 0).unwrap());
    MavenRemotePublisher::new(Arc::new(DefaultTransportFactory::default()), Arc::new(time), options)
}

#[tokio::test]
async fn successive_publishes_to_file_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repository = RepositoryDescriptor {
        name: "local".to_string(),
        url: Url::from_directory_path(dir.path()).unwrap(),
        authentication: Authentication::None,
        timeout: Duration::from_secs(5),
    };
    let options = PublishOptions {
        strategy: ReconciliationStrategy::ConditionalWrite { max_attempts: 3 },
        ..Default::default()
    };

    let first = publisher_at(10, options).publish(&publication(), &repository).await.unwrap();
    let second = publisher_at(11, options).publish(&publication(), &repository).await.unwrap();

    assert_eq!(first.identity.build_number, 1);
    assert_eq!(second.identity.build_number, 2);
    assert_eq!(second.timestamped_version, "2.1-20230615.110000-2");

    let version_dir = dir.path().join("org/example/widget/2.1-SNAPSHOT");
    assert!(version_dir.join("widget-2.1-20230615.100000-1.jar").exists());
    assert!(version_dir.join("widget-2.1-20230615.110000-2-javadoc.jar").exists());
    assert!(version_dir.join("widget-2.1-20230615.110000-2-javadoc.jar.sha1").exists());

    let xml = std::fs::read_to_string(version_dir.join("maven-metadata.xml")).unwrap();
    let versioning = parse_remote_metadata(&xml).unwrap().versioning.unwrap();
    let snapshot = versioning.snapshot.unwrap();
    assert_eq!(snapshot.timestamp.as_deref(), Some("20230615.110000"));
    assert_eq!(snapshot.buildNumber.as_deref(), Some("2"));
    assert_eq!(versioning.lastUpdated.as_deref(), Some("20230615110000"));

    let entries = versioning.snapshotVersions.unwrap().snapshotVersion;
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.value.as_deref() == Some("2.1-20230615.110000-2")));
    assert!(entries.iter().all(|e| e.updated.as_deref() == Some("20230615110000")));
    assert_eq!(entries[2].classifier.as_deref(), Some("javadoc"));

    let artifact_xml = std::fs::read_to_string(dir.path().join("org/example/widget/maven-metadata.xml")).unwrap();
    let artifact_versioning = parse_remote_metadata(&artifact_xml).unwrap().versioning.unwrap();
    assert_eq!(artifact_versioning.versions.unwrap().version, vec!["2.1-SNAPSHOT"]);
    assert_eq!(artifact_versioning.latest.as_deref(), Some("2.1-SNAPSHOT"));
}

#[tokio::test]
async fn identical_inputs_produce_identical_metadata() {
    let first = InMemoryRepository::new();
    let second = InMemoryRepository::new();
    for repo in [&first, &second] {
        repo.insert("org/example/widget/2.1-SNAPSHOT/maven-metadata.xml", "<metadata><versioning><snapshot><buildNumber>4</buildNumber></snapshot></versioning></metadata>");
        publisher_at(9, PublishOptions::default()).publish_to(&publication(), repo).await.unwrap();
    }

    assert_eq!(first.names(), second.names());
    for name in first.names() {
        assert_eq!(first.get(&name), second.get(&name), "{} differs", name);
    }
}
