use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::deliver::blob_url::BlobUrlRegistry;
use crate::deliver::host::{DeliveryHost, MANUAL_SAVE_INSTRUCTIONS, SharePayload, ShareResult};
use crate::encode::encoder::ExportArtifact;
use crate::foundation::error::{RetouchError, RetouchResult};

/// One way of getting the artifact to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryTier {
    Share,
    Download,
    ManualSave,
}

impl DeliveryTier {
    /// Tier order for the device class. Touch devices prefer the share sheet.
    pub fn order(is_touch_device: bool) -> [DeliveryTier; 3] {
        if is_touch_device {
            [Self::Share, Self::Download, Self::ManualSave]
        } else {
            [Self::Download, Self::Share, Self::ManualSave]
        }
    }
}

impl fmt::Display for DeliveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Share => "share",
            Self::Download => "download",
            Self::ManualSave => "manual-save",
        })
    }
}

/// Terminal result of a delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Shared,
    Downloaded,
    OpenedForManualSave,
    /// The user dismissed the share sheet. Not an error; no further tiers are tried.
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    pub outcome: DeliveryOutcome,
    pub tier: DeliveryTier,
    /// Tiers skipped or failed before the final one, with reasons.
    pub failures: Vec<(DeliveryTier, String)>,
}

/// Share, download and manual-save as ordered tiers of one delivery path.
#[derive(Clone, Debug)]
pub struct DeliveryAdapter {
    blobs: BlobUrlRegistry,
    manual_save_ttl: Duration,
}

impl DeliveryAdapter {
    pub fn new(blobs: BlobUrlRegistry, manual_save_ttl: Duration) -> Self {
        Self {
            blobs,
            manual_save_ttl,
        }
    }

    pub fn blobs(&self) -> &BlobUrlRegistry {
        &self.blobs
    }

    /// Try each tier once, in device order, until one succeeds or the user cancels.
    #[tracing::instrument(skip_all, fields(filename = %artifact.filename))]
    pub async fn deliver(
        &self,
        host: &dyn DeliveryHost,
        artifact: Arc<ExportArtifact>,
    ) -> RetouchResult<DeliveryReport> {
        let is_touch = host.is_touch_device();
        let mut failures = Vec::new();

        for tier in DeliveryTier::order(is_touch) {
            let attempt = match tier {
                DeliveryTier::Share => self.try_share(host, &artifact).await,
                DeliveryTier::Download => self.try_download(host, &artifact).await,
                DeliveryTier::ManualSave => self.try_manual_save(host, &artifact).await,
            };
            match attempt {
                Ok(outcome) => {
                    tracing::debug!(%tier, ?outcome, "delivered");
                    return Ok(DeliveryReport {
                        outcome,
                        tier,
                        failures,
                    });
                }
                Err(reason) => {
                    tracing::warn!(%tier, %reason, "delivery tier failed");
                    failures.push((tier, reason));
                }
            }
        }

        let detail = failures
            .iter()
            .map(|(tier, reason)| format!("{tier}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ");
        Err(RetouchError::delivery(detail))
    }

    async fn try_share(
        &self,
        host: &dyn DeliveryHost,
        artifact: &Arc<ExportArtifact>,
    ) -> Result<DeliveryOutcome, String> {
        if !host.can_share_files() {
            return Err("file sharing unavailable".to_owned());
        }
        match host.share(&SharePayload::for_artifact(artifact.clone())).await {
            Ok(ShareResult::Completed) => Ok(DeliveryOutcome::Shared),
            Ok(ShareResult::Cancelled) => Ok(DeliveryOutcome::Cancelled),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn try_download(
        &self,
        host: &dyn DeliveryHost,
        artifact: &Arc<ExportArtifact>,
    ) -> Result<DeliveryOutcome, String> {
        if !host.can_download() {
            return Err("download unavailable".to_owned());
        }
        let url = self.blobs.create(artifact.clone());
        let result = host.download(&url, &artifact.filename).await;
        self.blobs.revoke(&url);
        result
            .map(|()| DeliveryOutcome::Downloaded)
            .map_err(|e| e.to_string())
    }

    async fn try_manual_save(
        &self,
        host: &dyn DeliveryHost,
        artifact: &Arc<ExportArtifact>,
    ) -> Result<DeliveryOutcome, String> {
        let url = self.blobs.create(artifact.clone());
        match host.open_manual_save(&url, MANUAL_SAVE_INSTRUCTIONS).await {
            Ok(()) => {
                // The new context still reads the URL, so release it later.
                self.blobs.revoke_after(url, self.manual_save_ttl);
                Ok(DeliveryOutcome::OpenedForManualSave)
            }
            Err(e) => {
                self.blobs.revoke(&url);
                Err(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/deliver/adapter.rs"]
mod tests;
