use std::sync::Arc;

use crate::deliver::blob_url::BlobUrl;
use crate::encode::encoder::ExportArtifact;
use crate::foundation::error::RetouchResult;

pub const SHARE_TITLE: &str = "Edited Image";
pub const SHARE_TEXT: &str = "Check out this image I created!";
pub const MANUAL_SAVE_INSTRUCTIONS: &str =
    "Long-press the image and choose \"Save Image\" to keep it.";

/// Native share sheet request.
#[derive(Clone, Debug)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub file: Arc<ExportArtifact>,
}

impl SharePayload {
    pub fn for_artifact(file: Arc<ExportArtifact>) -> Self {
        Self {
            title: SHARE_TITLE.to_owned(),
            text: SHARE_TEXT.to_owned(),
            file,
        }
    }
}

/// How the share sheet was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareResult {
    Completed,
    /// The user dismissed the sheet.
    Cancelled,
}

/// Platform hooks the delivery adapter drives.
///
/// Capability probes are queried at delivery time on every export and never cached, so a host
/// whose capabilities change between exports is handled correctly.
#[async_trait::async_trait]
pub trait DeliveryHost: Send + Sync {
    /// Whether the native share sheet accepts files.
    fn can_share_files(&self) -> bool;

    /// Whether a programmatic file download can be triggered.
    fn can_download(&self) -> bool;

    /// Touch-class device; reorders delivery tiers and lowers the snapshot scale.
    fn is_touch_device(&self) -> bool;

    async fn share(&self, payload: &SharePayload) -> RetouchResult<ShareResult>;

    /// Hand `url` to the platform download mechanism under `filename`.
    async fn download(&self, url: &BlobUrl, filename: &str) -> RetouchResult<()>;

    /// Open `url` in a new browsing context showing `instructions`.
    async fn open_manual_save(&self, url: &BlobUrl, instructions: &str) -> RetouchResult<()>;
}
