use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::RecordStore;
use crate::error::TransportError;

/// In-process store. Can be switched to fail every write.
#[derive(Default)]
pub struct MemoryRecordStore {
    documents: Mutex<Vec<(String, serde_json::Value)>>,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    /// A store whose writes always fail, as if the network were down.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_unavailable(true);
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Documents written to `collection`, oldest first.
    pub fn documents(&self, collection: &str) -> Vec<serde_json::Value> {
        self.documents
            .lock()
            .map(|docs| {
                docs.iter()
                    .filter(|(c, _)| c == collection)
                    .map(|(_, d)| d.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn add_document(
        &self,
        collection: &str,
        data: &serde_json::Value,
    ) -> Result<String, TransportError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("store is offline".into()));
        }
        let mut docs = self
            .documents
            .lock()
            .map_err(|_| TransportError::Unavailable("store lock poisoned".into()))?;
        docs.push((collection.to_string(), data.clone()));
        Ok(format!("{collection}-{}", docs.len()))
    }
}
