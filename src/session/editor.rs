use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::assets::fonts::FontBook;
use crate::assets::image::{DecodeStatus, ImageAsset};
use crate::capture::policy::CapturePolicy;
use crate::capture::strategy::{CaptureRequest, CaptureStrategy};
use crate::deliver::adapter::{DeliveryAdapter, DeliveryReport};
use crate::deliver::blob_url::BlobUrlRegistry;
use crate::deliver::host::DeliveryHost;
use crate::edit::state::EditState;
use crate::encode::encoder::{ExportArtifact, encode_async};
use crate::filters::channels::ChannelValues;
use crate::foundation::config::RetouchOpts;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::render::compose::ComposeOutcome;
use crate::render::preview::LiveView;
use crate::render::surface::Surface;

/// One user's editing session: the current source image, the edit state and the live preview.
pub struct EditorSession {
    opts: RetouchOpts,
    fonts: Arc<FontBook>,
    image: Option<Arc<ImageAsset>>,
    generation: Arc<AtomicU64>,
    exporting: Arc<AtomicBool>,
    edit: EditState,
    view: LiveView,
    rendered_edit: Option<EditState>,
    blobs: BlobUrlRegistry,
}

impl EditorSession {
    pub fn new(opts: RetouchOpts, fonts: FontBook) -> RetouchResult<Self> {
        opts.validate()?;
        let fonts = Arc::new(fonts);
        Ok(Self {
            view: LiveView::new(fonts.clone()),
            opts,
            fonts,
            image: None,
            generation: Arc::new(AtomicU64::new(0)),
            exporting: Arc::new(AtomicBool::new(false)),
            edit: EditState::new(),
            rendered_edit: None,
            blobs: BlobUrlRegistry::new(),
        })
    }

    pub fn opts(&self) -> &RetouchOpts {
        &self.opts
    }

    /// Decode `bytes` off the async thread and make the result the current image.
    ///
    /// The asset is stored even when decoding fails so the UI can show the failure; the call then
    /// returns [`RetouchError::Decode`]. Any export still running for the previous image is
    /// invalidated.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn load_image(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
    ) -> RetouchResult<Arc<ImageAsset>> {
        self.replace_image(ImageAsset::pending(name));
        let owned_name = name.to_owned();
        let asset = bounded(
            "decode",
            self.opts.stage_timeout(),
            join_blocking(move || Ok(ImageAsset::decode(owned_name, &bytes))),
        )
        .await?;
        let asset = self.replace_image(asset);
        match asset.status() {
            DecodeStatus::Failed(reason) => Err(RetouchError::decode(reason.clone())),
            _ => Ok(asset),
        }
    }

    /// Install an already constructed asset as the current image.
    pub fn set_image(&mut self, asset: ImageAsset) -> Arc<ImageAsset> {
        self.replace_image(asset)
    }

    fn replace_image(&mut self, asset: ImageAsset) -> Arc<ImageAsset> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(image = asset.name(), generation, "source image replaced");
        let asset = Arc::new(asset);
        self.image = Some(asset.clone());
        self.view.clear();
        self.rendered_edit = None;
        asset
    }

    pub fn image(&self) -> Option<&Arc<ImageAsset>> {
        self.image.as_ref()
    }

    pub fn edit(&self) -> &EditState {
        &self.edit
    }

    pub fn edit_mut(&mut self) -> &mut EditState {
        &mut self.edit
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn blobs(&self) -> &BlobUrlRegistry {
        &self.blobs
    }

    /// Width preview-scale lengths refer to for the current image.
    pub fn reference_width(&self) -> u32 {
        if let Some(w) = self.opts.reference_width {
            return w;
        }
        self.image
            .as_ref()
            .and_then(|i| i.size())
            .map(|s| s.fit_within(self.opts.preview_box).width)
            .unwrap_or(self.opts.preview_box.width)
    }

    /// Re-render the live preview from the current edit state.
    pub fn render_preview(&mut self) -> RetouchResult<ComposeOutcome> {
        let Some(image) = self.image.clone() else {
            return Ok(ComposeOutcome::NotReady);
        };
        let out = self.view.render(&image, &self.edit, self.opts.preview_box)?;
        if matches!(out, ComposeOutcome::Drawn(_)) {
            self.rendered_edit = Some(self.edit.clone());
        }
        Ok(out)
    }

    pub fn preview(&self) -> Option<&Surface> {
        self.view.surface()
    }

    pub fn preview_size(&self) -> Option<PixelSize> {
        self.view.tree().map(|t| t.size)
    }

    /// Snapshot the session for an export. Only one export may be in flight at a time.
    pub fn begin_export(&mut self) -> RetouchResult<ExportJob> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| RetouchError::validation("no image loaded"))?;
        if image.is_ready() && self.rendered_edit.as_ref() != Some(&self.edit) {
            self.render_preview()?;
        }
        if self
            .exporting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RetouchError::validation("an export is already in progress"));
        }

        Ok(ExportJob {
            request: CaptureRequest {
                image,
                edit: self.edit.clone(),
                fonts: self.fonts.clone(),
                view: self.view.tree(),
                reference_width: self.reference_width(),
            },
            opts: self.opts.clone(),
            blobs: self.blobs.clone(),
            generation: self.generation.clone(),
            started_at: self.generation(),
            strategies: None,
            _guard: ExportGuard(self.exporting.clone()),
        })
    }

    /// Begin and run an export in one call.
    pub async fn export(&mut self, host: &dyn DeliveryHost) -> RetouchResult<ExportReport> {
        self.begin_export()?.run(host).await
    }
}

struct ExportGuard(Arc<AtomicBool>);

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What an export produced and how it reached the user.
#[derive(Debug)]
pub struct ExportReport {
    pub artifact: Arc<ExportArtifact>,
    pub size: PixelSize,
    /// Filter channels the export was rendered with.
    pub channels: ChannelValues,
    /// Capture strategy that produced the surface.
    pub strategy: String,
    pub capture_failures: Vec<(String, String)>,
    pub delivery: DeliveryReport,
}

/// An export snapshotted from a session. Later edits or image loads do not affect its inputs.
pub struct ExportJob {
    request: CaptureRequest,
    opts: RetouchOpts,
    blobs: BlobUrlRegistry,
    generation: Arc<AtomicU64>,
    started_at: u64,
    strategies: Option<Vec<Box<dyn CaptureStrategy>>>,
    _guard: ExportGuard,
}

impl ExportJob {
    /// Replace the capture chain, e.g. to force a fallback.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn CaptureStrategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn edit(&self) -> &EditState {
        &self.request.edit
    }

    fn ensure_current(&self) -> RetouchResult<()> {
        if self.generation.load(Ordering::SeqCst) != self.started_at {
            tracing::warn!("source image replaced during export, discarding result");
            return Err(RetouchError::Invalidated);
        }
        Ok(())
    }

    /// Capture, encode and deliver, checking for invalidation between stages.
    #[tracing::instrument(skip_all, fields(image = self.request.image.name()))]
    pub async fn run(mut self, host: &dyn DeliveryHost) -> RetouchResult<ExportReport> {
        self.ensure_current()?;
        match self.request.image.status() {
            DecodeStatus::Pending => return Err(RetouchError::NotReady),
            DecodeStatus::Failed(reason) => return Err(RetouchError::decode(reason.clone())),
            DecodeStatus::Decoded(_) => {}
        }

        let policy = match self.strategies.take() {
            Some(strategies) => {
                CapturePolicy::new(strategies).with_strategy_timeout(self.opts.stage_timeout())
            }
            None => CapturePolicy::standard(&self.opts, host.is_touch_device()),
        };
        let captured = policy.capture_within(self.request.clone()).await?;
        self.ensure_current()?;

        let size = captured.surface.size();
        let artifact = bounded(
            "encode",
            self.opts.stage_timeout(),
            encode_async(
                captured.surface,
                self.opts.encode_settings(),
                self.request.image.base_name().to_owned(),
            ),
        )
        .await?;
        let artifact = Arc::new(artifact);
        self.ensure_current()?;

        let adapter = DeliveryAdapter::new(self.blobs.clone(), self.opts.blob_url_ttl());
        let delivery = bounded(
            "delivery",
            self.opts.delivery_timeout(),
            adapter.deliver(host, artifact.clone()),
        )
        .await?;

        Ok(ExportReport {
            artifact,
            size,
            channels: self.request.edit.channel_values(),
            strategy: captured.strategy,
            capture_failures: captured.failures,
            delivery,
        })
    }
}

async fn bounded<T>(
    stage: &str,
    limit: Duration,
    fut: impl Future<Output = RetouchResult<T>>,
) -> RetouchResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(out) => out,
        Err(_) => Err(RetouchError::timeout(format!(
            "{stage} did not finish within {} ms",
            limit.as_millis()
        ))),
    }
}

async fn join_blocking<T: Send + 'static>(
    f: impl FnOnce() -> RetouchResult<T> + Send + 'static,
) -> RetouchResult<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RetouchError::Other(anyhow::anyhow!("blocking worker failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
