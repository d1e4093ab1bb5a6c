use bytes::Bytes;
use tracing::trace;

use crate::error::TransportError;
use crate::transport::{RemoteRepository, WriteOutcome, WritePrecondition};
use crate::util::checksums::Checksums;

/// Writes a resource and, if it was written, its `.sha1` and `.md5` checksum files.
///
/// The checksum files are written unconditionally: they belong to whichever content won.
pub async fn upload_with_checksums(
    repository: &dyn RemoteRepository,
    name: &str,
    content: Bytes,
    precondition: WritePrecondition,
) -> Result<WriteOutcome, TransportError> {
    let checksums = Checksums::of(&content);

    trace!("uploading {} ({} bytes)", name, content.len());
    let outcome = repository.write(name, content, precondition).await?;
    if outcome == WriteOutcome::PreconditionFailed {
        return Ok(outcome);
    }

    repository.write(&format!("{}.sha1", name), Bytes::from(checksums.sha1_hex()), WritePrecondition::Unconditional).await?;
    repository.write(&format!("{}.md5", name), Bytes::from(checksums.md5_hex()), WritePrecondition::Unconditional).await?;
    Ok(outcome)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::in_memory_transport::InMemoryRepository;

    #[tokio::test]
    async fn test_writes_checksums() {
        let repo = InMemoryRepository::new();
        let outcome = upload_with_checksums(&repo, "a/b.jar", Bytes::from_static(b"abc"), WritePrecondition::Unconditional).await.unwrap();

        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(repo.names(), vec!["a/b.jar", "a/b.jar.md5", "a/b.jar.sha1"]);
        assert_eq!(repo.get("a/b.jar.sha1"), Some(Bytes::from_static(b"a9993e364706816aba3e25717850c26c9cd0d89d")));
        assert_eq!(repo.get("a/b.jar.md5"), Some(Bytes::from_static(b"900150983cd24fb0d6963f7d28e17f72")));
    }

    #[tokio::test]
    async fn test_no_checksums_when_precondition_fails() {
        let repo = InMemoryRepository::new();
        repo.insert("a/b.xml", "old");

        let outcome = upload_with_checksums(&repo, "a/b.xml", Bytes::from_static(b"new"), WritePrecondition::IfAbsent).await.unwrap();

        assert_eq!(outcome, WriteOutcome::PreconditionFailed);
        assert_eq!(repo.names(), vec!["a/b.xml"]);
    }
}
