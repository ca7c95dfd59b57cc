use async_trait::async_trait;

use crate::error::TransportError;

mod http;
mod memory;
mod unconfigured;

pub use http::HttpRecordStore;
pub use memory::MemoryRecordStore;
pub use unconfigured::UnconfiguredStore;

/// Collection bug reports are written to. The store also holds `games` and `users`.
pub const BUGS_COLLECTION: &str = "bugs";

/// Write access to the remote document store.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Short name used in log lines.
    fn backend_tag(&self) -> &'static str;

    /// Add `data` as a new document and return the store-assigned reference.
    async fn add_document(
        &self,
        collection: &str,
        data: &serde_json::Value,
    ) -> Result<String, TransportError>;
}
