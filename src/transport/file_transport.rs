use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{create_dir_all, remove_file, rename, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, trace};
use uuid::Uuid;

use crate::error::TransportError;
use crate::transport::{RemoteRepository, RemoteResource, WriteOutcome, WritePrecondition};
use crate::util::checksums::Checksums;

/// A repository in a local (or mounted) directory. ETags are the SHA1 of the file content.
///
/// NB: Conditional writes compare and write under a lock held by this instance, so they are only
///  atomic with respect to other writers sharing the instance, not to other processes.
pub struct FileRepository {
    root: PathBuf,
    write_lock: Mutex<()>,
}
impl FileRepository {
    pub fn new(root: PathBuf) -> FileRepository {
        FileRepository {
            root,
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, TransportError> {
        let relative = Path::new(name.trim_start_matches('/'));
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(TransportError::InvalidLocation(name.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn etag(content: &[u8]) -> String {
        Checksums::of(content).sha1_hex()
    }

    async fn read_path(path: &Path, name: &str) -> Result<Option<Bytes>, TransportError> {
        match tokio::fs::read(path).await {
            Ok(content) => Ok(Some(Bytes::from(content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TransportError::io(name, e)),
        }
    }

    /// Writes to a temporary sibling file first and renames it, so readers never see partial content
    async fn write_atomically(path: &Path, name: &str, content: &[u8]) -> Result<(), TransportError> {
        let parent = path.parent()
            .ok_or_else(|| TransportError::InvalidLocation(name.to_string()))?;
        create_dir_all(parent).await
            .map_err(|e| TransportError::io(name, e))?;

        let mut temp_path = parent.to_path_buf();
        temp_path.push(format!(".{}.writing", Uuid::new_v4().as_hyphenated()));

        let result = async {
            let mut file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp_path)
                .await?;
            file.write_all(content).await?;
            file.sync_all().await?;
            rename(&temp_path, path).await
        }.await;

        if let Err(e) = result {
            if let Err(cleanup) = remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    error!("error cleaning up {} after failed write: {}", temp_path.display(), cleanup);
                }
            }
            return Err(TransportError::io(name, e));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteRepository for FileRepository {
    async fn read(&self, name: &str) -> Result<Option<RemoteResource>, TransportError> {
        let path = self.path_for(name)?;
        trace!("reading {}", path.display());

        Ok(Self::read_path(&path, name).await?
            .map(|content| RemoteResource {
                etag: Some(Self::etag(&content)),
                content,
            }))
    }

    async fn write(&self, name: &str, content: Bytes, precondition: WritePrecondition) -> Result<WriteOutcome, TransportError> {
        let path = self.path_for(name)?;
        trace!("writing {}", path.display());

        let _guard = self.write_lock.lock().await;

        let precondition_holds = match &precondition {
            WritePrecondition::Unconditional => true,
            WritePrecondition::IfAbsent => Self::read_path(&path, name).await?.is_none(),
            WritePrecondition::IfMatch(expected) => {
                Self::read_path(&path, name).await?
                    .map(|current| &Self::etag(&current) == expected)
                    .unwrap_or(false)
            }
        };
        if !precondition_holds {
            trace!("precondition {:?} failed for {}", precondition, path.display());
            return Ok(WriteOutcome::PreconditionFailed);
        }

        Self::write_atomically(&path, name, &content).await?;
        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().to_path_buf());

        assert_eq!(repo.read("org/example/maven-metadata.xml").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().to_path_buf());

        let outcome = repo.write("org/example/widget/a.pom", Bytes::from_static(b"<project/>"), WritePrecondition::Unconditional).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let on_disk = std::fs::read(dir.path().join("org/example/widget/a.pom")).unwrap();
        assert_eq!(on_disk, b"<project/>");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("org/example/widget")).unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(".writing"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_conditional_writes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().to_path_buf());

        assert_eq!(repo.write("m.xml", Bytes::from_static(b"1"), WritePrecondition::IfAbsent).await.unwrap(), WriteOutcome::Written);
        assert_eq!(repo.write("m.xml", Bytes::from_static(b"2"), WritePrecondition::IfAbsent).await.unwrap(), WriteOutcome::PreconditionFailed);

        let read = repo.read("m.xml").await.unwrap().unwrap();
        assert_eq!(read.content, Bytes::from_static(b"1"));
        let etag = read.etag.unwrap();

        assert_eq!(repo.write("m.xml", Bytes::from_static(b"3"), WritePrecondition::IfMatch(etag.clone())).await.unwrap(), WriteOutcome::Written);
        assert_eq!(repo.write("m.xml", Bytes::from_static(b"4"), WritePrecondition::IfMatch(etag)).await.unwrap(), WriteOutcome::PreconditionFailed);
        assert_eq!(repo.read("m.xml").await.unwrap().unwrap().content, Bytes::from_static(b"3"));
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("repo"));

        let result = repo.write("../outside.xml", Bytes::from_static(b"x"), WritePrecondition::Unconditional).await;
        assert!(matches!(result, Err(TransportError::InvalidLocation(_))));
    }
}
