use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::transport::{RemoteRepository, RemoteResource, WriteOutcome, WritePrecondition};

/// in-memory repository, neither optimized nor particularly robust - for testing and dry runs.
///
/// Every stored resource carries a revision counter that serves as its etag.
#[derive(Default)]
pub struct InMemoryRepository {
    data: Mutex<HashMap<String, (Bytes, u64)>>,
    next_revision: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
}
impl InMemoryRepository {
    pub fn new() -> InMemoryRepository {
        Default::default()
    }

    /// Stores a resource directly, bypassing preconditions and counters
    pub fn insert(&self, name: &str, content: impl Into<Bytes>) {
        let revision = self.next_revision();
        self.data.lock()
            .unwrap()
            .insert(name.to_string(), (content.into(), revision));
    }

    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.data.lock()
            .unwrap()
            .get(name)
            .map(|(content, _)| content.clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.lock()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn next_revision(&self) -> u64 {
        self.next_revision.fetch_add(1, Ordering::SeqCst) as u64 + 1
    }
}

#[async_trait]
impl RemoteRepository for InMemoryRepository {
    async fn read(&self, name: &str) -> Result<Option<RemoteResource>, TransportError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        Ok(self.data.lock()
            .unwrap()
            .get(name)
            .map(|(content, revision)| RemoteResource {
                content: content.clone(),
                etag: Some(revision.to_string()),
            }))
    }

    async fn write(&self, name: &str, content: Bytes, precondition: WritePrecondition) -> Result<WriteOutcome, TransportError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        let revision = self.next_revision();
        let mut lock = self.data.lock().unwrap();

        let current = lock.get(name).map(|(_, revision)| revision.to_string());
        let precondition_holds = match precondition {
            WritePrecondition::Unconditional => true,
            WritePrecondition::IfAbsent => current.is_none(),
            WritePrecondition::IfMatch(expected) => current == Some(expected),
        };

        if precondition_holds {
            lock.insert(name.to_string(), (content, revision));
            Ok(WriteOutcome::Written)
        }
        else {
            Ok(WriteOutcome::PreconditionFailed)
        }
    }
}
