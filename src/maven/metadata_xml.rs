//! Reading and writing the `maven-metadata.xml` file format described at
//!  https://maven.apache.org/ref/3.9.5/maven-repository-metadata/repository-metadata.html
//!
//! Reading is lenient: every element is optional and unknown elements are ignored, so documents
//!  written by other tools can be consulted. Writing produces the exact element order Maven
//!  clients expect.

#![allow(non_snake_case)]

use std::io::Write;

use serde::Deserialize;
use xml::common::XmlVersion;
use xml::reader::{EventReader, XmlEvent as ReaderEvent};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::error::{MetadataParseError, PublishError};
use crate::maven::metadata::{ArtifactMetadataDocument, MetadataDocument, MODEL_VERSION};

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub modelVersion: Option<String>,
    pub groupId: Option<String>,
    pub artifactId: Option<String>,
    pub version: Option<String>,
    pub versioning: Option<RemoteVersioning>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteVersioning {
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Option<RemoteVersions>,
    pub lastUpdated: Option<String>,
    pub snapshot: Option<RemoteSnapshot>,
    pub snapshotVersions: Option<RemoteSnapshotVersions>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteVersions {
    #[serde(default)]
    pub version: Vec<String>,
}

/// NB: `buildNumber` is kept as text so that a malformed value does not make the whole document
///  unreadable; interpreting it is the build number resolver's decision
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub timestamp: Option<String>,
    pub buildNumber: Option<String>,
    pub localCopy: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteSnapshotVersions {
    #[serde(default)]
    pub snapshotVersion: Vec<RemoteSnapshotVersion>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteSnapshotVersion {
    pub classifier: Option<String>,
    pub extension: Option<String>,
    pub value: Option<String>,
    pub updated: Option<String>,
}

/// Parses a `maven-metadata.xml` document. Well-formed XML with a root other than `<metadata>`
///  (e.g. a proxy's HTML login page) is an error, not an empty document.
pub fn parse_remote_metadata(xml: &str) -> Result<RemoteMetadata, MetadataParseError> {
    check_root_element(xml)?;
    Ok(serde_xml_rs::from_str(xml)?)
}

fn check_root_element(xml: &str) -> Result<(), MetadataParseError> {
    for event in EventReader::from_str(xml) {
        match event? {
            ReaderEvent::StartElement { name, .. } => {
                return if name.local_name == "metadata" {
                    Ok(())
                }
                else {
                    Err(MetadataParseError::UnexpectedRoot(name.local_name))
                };
            }
            ReaderEvent::EndDocument => break,
            _ => {}
        }
    }
    Err(MetadataParseError::NoRoot)
}

pub fn write_snapshot_metadata(doc: &MetadataDocument) -> Result<Vec<u8>, PublishError> {
    let mut out = Vec::new();
    {
        let mut w = new_writer(&mut out)?;
        w.write(XmlEvent::start_element("metadata").attr("modelVersion", MODEL_VERSION))?;
        text_element(&mut w, "groupId", &doc.group_id.0)?;
        text_element(&mut w, "artifactId", &doc.artifact_id.0)?;
        text_element(&mut w, "version", doc.version.as_str())?;

        let versioning = &doc.versioning;
        w.write(XmlEvent::start_element("versioning"))?;

        w.write(XmlEvent::start_element("snapshot"))?;
        text_element(&mut w, "timestamp", versioning.snapshot.timestamp.as_str())?;
        text_element(&mut w, "buildNumber", &versioning.snapshot.build_number.to_string())?;
        w.write(XmlEvent::end_element())?;

        text_element(&mut w, "lastUpdated", &versioning.last_updated)?;

        w.write(XmlEvent::start_element("snapshotVersions"))?;
        for entry in &versioning.entries {
            w.write(XmlEvent::start_element("snapshotVersion"))?;
            if let Some(classifier) = entry.classifier.as_option() {
                text_element(&mut w, "classifier", classifier)?;
            }
            text_element(&mut w, "extension", &entry.extension)?;
            text_element(&mut w, "value", &entry.resolved_version)?;
            text_element(&mut w, "updated", &entry.last_updated)?;
            w.write(XmlEvent::end_element())?;
        }
        w.write(XmlEvent::end_element())?; // snapshotVersions

        w.write(XmlEvent::end_element())?; // versioning
        w.write(XmlEvent::end_element())?; // metadata
    }
    Ok(out)
}

pub fn write_artifact_metadata(doc: &ArtifactMetadataDocument) -> Result<Vec<u8>, PublishError> {
    let mut out = Vec::new();
    {
        let mut w = new_writer(&mut out)?;
        w.write(XmlEvent::start_element("metadata").attr("modelVersion", MODEL_VERSION))?;
        text_element(&mut w, "groupId", &doc.group_id.0)?;
        text_element(&mut w, "artifactId", &doc.artifact_id.0)?;

        w.write(XmlEvent::start_element("versioning"))?;
        text_element(&mut w, "latest", &doc.latest)?;
        w.write(XmlEvent::start_element("versions"))?;
        for version in &doc.versions {
            text_element(&mut w, "version", version)?;
        }
        w.write(XmlEvent::end_element())?;
        text_element(&mut w, "lastUpdated", &doc.last_updated)?;
        w.write(XmlEvent::end_element())?;

        w.write(XmlEvent::end_element())?;
    }
    Ok(out)
}

fn new_writer<W: Write>(sink: W) -> Result<EventWriter<W>, PublishError> {
    let mut w = EmitterConfig::new()
        .perform_indent(true)
        .create_writer(sink);
    w.write(XmlEvent::StartDocument {
        version: XmlVersion::Version10,
        encoding: Some("UTF-8"),
        standalone: None,
    })?;
    Ok(w)
}

fn text_element<W: Write>(w: &mut EventWriter<W>, name: &str, text: &str) -> xml::writer::Result<()> {
    w.write(XmlEvent::start_element(name))?;
    w.write(XmlEvent::characters(text))?;
    w.write(XmlEvent::end_element())
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;
    use crate::maven::coordinates::{MavenArtifactId, MavenClassifier, MavenGroupId, SnapshotVersion};
    use crate::maven::metadata::{SnapshotIdentity, SnapshotVersionEntry, SnapshotVersioning};
    use crate::maven::timestamp::SnapshotTimestamp;

    fn snapshot_document() -> MetadataDocument {
        let entry = |classifier: MavenClassifier, extension: &str| SnapshotVersionEntry {
            classifier,
            extension: extension.to_string(),
            resolved_version: "1.0-20230615.120000-3".to_string(),
            last_updated: "20230615120000".to_string(),
        };

        MetadataDocument {
            group_id: MavenGroupId("org.example".to_string()),
            artifact_id: MavenArtifactId("widget".to_string()),
            version: SnapshotVersion::parse("1.0-SNAPSHOT").unwrap(),
            versioning: SnapshotVersioning {
                snapshot: SnapshotIdentity {
                    timestamp: SnapshotTimestamp::parse("20230615.120000").unwrap(),
                    build_number: 3,
                },
                last_updated: "20230615120000".to_string(),
                entries: vec![
                    entry(MavenClassifier::Unclassified, "jar"),
                    entry(MavenClassifier::Classified("sources".to_string()), "jar"),
                ],
            },
        }
    }

    #[test]
    fn test_write_snapshot_metadata() {
        let xml = String::from_utf8(write_snapshot_metadata(&snapshot_document()).unwrap()).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<metadata modelVersion="1.1.0">"#));

        let ordered = [
            "<groupId>org.example</groupId>",
            "<artifactId>widget</artifactId>",
            "<version>1.0-SNAPSHOT</version>",
            "<versioning>",
            "<snapshot>",
            "<timestamp>20230615.120000</timestamp>",
            "<buildNumber>3</buildNumber>",
            "</snapshot>",
            "<lastUpdated>20230615120000</lastUpdated>",
            "<snapshotVersions>",
            "<extension>jar</extension>",
            "<value>1.0-20230615.120000-3</value>",
            "<updated>20230615120000</updated>",
            "<classifier>sources</classifier>",
            "</snapshotVersions>",
            "</versioning>",
            "</metadata>",
        ];
        let mut pos = 0;
        for fragment in ordered {
            let found = xml[pos..].find(fragment)
                .unwrap_or_else(|| panic!("{} missing or out of order in {}", fragment, xml));
            pos += found + fragment.len();
        }

        assert_eq!(xml.matches("<classifier>").count(), 1);
    }

    #[test]
    fn test_written_document_reads_back() {
        let xml = String::from_utf8(write_snapshot_metadata(&snapshot_document()).unwrap()).unwrap();
        let parsed = parse_remote_metadata(&xml).unwrap();

        assert_eq!(parsed.modelVersion.as_deref(), Some("1.1.0"));
        let versioning = parsed.versioning.unwrap();
        let snapshot = versioning.snapshot.unwrap();
        assert_eq!(snapshot.buildNumber.as_deref(), Some("3"));
        assert_eq!(snapshot.timestamp.as_deref(), Some("20230615.120000"));
        let entries = versioning.snapshotVersions.unwrap().snapshotVersion;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].classifier, None);
        assert_eq!(entries[1].classifier.as_deref(), Some("sources"));
    }

    #[test]
    fn test_escapes_text() {
        let mut doc = snapshot_document();
        doc.group_id = MavenGroupId("a<b&c".to_string());
        let xml = String::from_utf8(write_snapshot_metadata(&doc).unwrap()).unwrap();
        assert!(xml.contains("<groupId>a&lt;b&amp;c</groupId>"));
    }

    #[test]
    fn test_parse_ignores_unknown_elements() {
        let parsed = parse_remote_metadata(r#"<?xml version="1.0" encoding="UTF-8"?>
            <metadata>
                <groupId>org.example</groupId>
                <plugins><plugin><prefix>x</prefix><artifactId>y</artifactId></plugin></plugins>
                <versioning>
                    <snapshot><timestamp>20230615.120000</timestamp><buildNumber>7</buildNumber><localCopy>false</localCopy></snapshot>
                </versioning>
            </metadata>"#).unwrap();

        assert_eq!(parsed.groupId.as_deref(), Some("org.example"));
        let snapshot = parsed.versioning.unwrap().snapshot.unwrap();
        assert_eq!(snapshot.buildNumber.as_deref(), Some("7"));
    }

    #[rstest]
    #[case::html("<html><body><p>Please log in</p></body></html>")]
    #[case::other_root(r#"<?xml version="1.0"?><project><groupId>org.example</groupId></project>"#)]
    fn test_parse_rejects_foreign_root(#[case] xml: &str) {
        assert!(matches!(parse_remote_metadata(xml), Err(MetadataParseError::UnexpectedRoot(_))));
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        assert!(parse_remote_metadata("").is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_document() {
        assert!(parse_remote_metadata("<metadata><versioning><snapshot>").is_err());
    }

    #[test]
    fn test_write_artifact_metadata() {
        let doc = ArtifactMetadataDocument {
            group_id: MavenGroupId("org.example".to_string()),
            artifact_id: MavenArtifactId("widget".to_string()),
            latest: "1.0-SNAPSHOT".to_string(),
            versions: vec!["0.9".to_string(), "1.0-SNAPSHOT".to_string()],
            last_updated: "20230615120000".to_string(),
        };
        let xml = String::from_utf8(write_artifact_metadata(&doc).unwrap()).unwrap();

        assert!(xml.contains("<latest>1.0-SNAPSHOT</latest>"));
        let first = xml.find("<version>0.9</version>").unwrap();
        let second = xml.find("<version>1.0-SNAPSHOT</version>").unwrap();
        assert!(first < second);
        assert!(xml.contains("<lastUpdated>20230615120000</lastUpdated>"));
    }
}
