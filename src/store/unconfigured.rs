use async_trait::async_trait;

use super::RecordStore;
use crate::error::TransportError;

/// Stand-in when no store URL is configured. Every write fails, so reports
/// land in the pending queue instead of being dropped.
pub struct UnconfiguredStore;

#[async_trait]
impl RecordStore for UnconfiguredStore {
    fn backend_tag(&self) -> &'static str {
        "unconfigured"
    }

    async fn add_document(
        &self,
        _collection: &str,
        _data: &serde_json::Value,
    ) -> Result<String, TransportError> {
        Err(TransportError::Unavailable(
            "no store URL configured (run `bugdesk config set-store`)".into(),
        ))
    }
}
