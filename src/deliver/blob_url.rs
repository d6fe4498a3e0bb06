use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::encode::encoder::ExportArtifact;

/// Temporary reference to an in-memory artifact, valid until revoked.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    live: HashMap<BlobUrl, Arc<ExportArtifact>>,
}

/// Shared table of live blob URLs. Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct BlobUrlRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl fmt::Debug for BlobUrlRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobUrlRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // The table stays consistent even if a holder panicked mid-operation.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create(&self, artifact: Arc<ExportArtifact>) -> BlobUrl {
        let mut reg = self.lock();
        reg.next_id += 1;
        let url = BlobUrl(format!("blob:retouch/{}", reg.next_id));
        reg.live.insert(url.clone(), artifact);
        tracing::debug!(%url, "created blob url");
        url
    }

    pub fn resolve(&self, url: &BlobUrl) -> Option<Arc<ExportArtifact>> {
        self.lock().live.get(url).cloned()
    }

    /// Release `url`. Returns false if it was already gone.
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        let removed = self.lock().live.remove(url).is_some();
        if removed {
            tracing::debug!(%url, "revoked blob url");
        }
        removed
    }

    /// Revoke `url` once `ttl` has elapsed, on the current tokio runtime.
    pub fn revoke_after(&self, url: BlobUrl, ttl: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            registry.revoke(&url);
        })
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/deliver/blob_url.rs"]
mod tests;
