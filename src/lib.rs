//! Retouch is a non-destructive photo edit composition and export pipeline.
//!
//! Edits never touch the source pixels. An [`EditState`] (filter preset, intensity, overlay
//! effects, text) is re-applied on every render:
//!
//! - Load a source image into an [`EditorSession`] and render the live preview
//! - Adjust the [`EditState`]; previews and exports recompose from scratch
//! - Export: capture a full-resolution surface, encode it and hand it to a [`DeliveryHost`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod capture;
pub(crate) mod deliver;
pub(crate) mod edit;
pub(crate) mod effects;
pub(crate) mod encode;
pub(crate) mod filters;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::config::RetouchOpts;
pub use crate::foundation::core::{PixelSize, Rgb8, Rgba8Premul};
pub use crate::foundation::error::{RetouchError, RetouchResult};

pub use crate::assets::fonts::{FontBook, ResolvedFont};
pub use crate::assets::image::{DecodeStatus, DecodedPixels, ImageAsset, decode_image};
pub use crate::capture::policy::{CapturePolicy, Captured};
pub use crate::capture::strategy::{CaptureRequest, CaptureStrategy, DirectRedraw, SurfaceSnapshot};
pub use crate::deliver::adapter::{DeliveryAdapter, DeliveryOutcome, DeliveryReport, DeliveryTier};
pub use crate::deliver::blob_url::{BlobUrl, BlobUrlRegistry};
pub use crate::deliver::host::{
    DeliveryHost, MANUAL_SAVE_INSTRUCTIONS, SHARE_TEXT, SHARE_TITLE, SharePayload, ShareResult,
};
pub use crate::edit::state::{DEFAULT_TEXT, DEFAULT_TEXT_SIZE_PX, EditState, FontId, TextSpec};
pub use crate::effects::catalog::{EffectId, EffectSet};
pub use crate::encode::encoder::{
    DEFAULT_JPEG_QUALITY, EncodeSettings, ExportArtifact, ExportFormat, encode, encode_async,
    export_filename,
};
pub use crate::filters::catalog::{
    Channel, ChannelUnit, FilterDefinition, NONE_FILTER_ID, filters, find_filter, resolve_filter,
};
pub use crate::filters::channels::{
    ChannelValues, INTENSITY_MAX, INTENSITY_MIN, INTENSITY_NOMINAL, compute_channel_values,
    css_filter_for,
};
pub use crate::render::compose::{ComposeOutcome, ComposeReport, Compositor};
pub use crate::render::preview::{LiveView, ViewNode, ViewTree, render_thumbnail};
pub use crate::render::surface::Surface;
pub use crate::session::editor::{EditorSession, ExportJob, ExportReport};
