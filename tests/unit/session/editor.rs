use std::sync::Mutex;
use std::sync::mpsc;

use super::*;
use crate::deliver::adapter::{DeliveryOutcome, DeliveryTier};
use crate::deliver::blob_url::BlobUrl;
use crate::deliver::host::{SharePayload, ShareResult};
use crate::edit::state::EditState;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn session() -> EditorSession {
    let mut s = EditorSession::new(RetouchOpts::default(), FontBook::new()).unwrap();
    s.edit_mut().set_text("");
    s
}

/// Desktop host that accepts every download.
#[derive(Default)]
struct DownloadHost {
    downloads: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl DeliveryHost for DownloadHost {
    fn can_share_files(&self) -> bool {
        false
    }

    fn can_download(&self) -> bool {
        true
    }

    fn is_touch_device(&self) -> bool {
        false
    }

    async fn share(&self, _payload: &SharePayload) -> RetouchResult<ShareResult> {
        Ok(ShareResult::Completed)
    }

    async fn download(&self, _url: &BlobUrl, filename: &str) -> RetouchResult<()> {
        self.downloads.lock().unwrap().push(filename.to_owned());
        Ok(())
    }

    async fn open_manual_save(&self, _url: &BlobUrl, _instructions: &str) -> RetouchResult<()> {
        Ok(())
    }
}

struct Gate(Mutex<mpsc::Receiver<()>>);

impl CaptureStrategy for Gate {
    fn name(&self) -> &str {
        "gate"
    }

    fn capture(&self, req: &CaptureRequest) -> RetouchResult<Surface> {
        self.0.lock().unwrap().recv().unwrap();
        Ok(Surface::filled(req.image.size().unwrap(), crate::foundation::core::Rgb8::WHITE))
    }
}

#[tokio::test]
async fn loading_an_image_renders_a_fitted_preview() {
    let mut s = session();
    s.load_image("cat.png", png_bytes(1920, 1080, [10, 20, 30, 255]))
        .await
        .unwrap();
    assert!(matches!(
        s.render_preview().unwrap(),
        ComposeOutcome::Drawn(_)
    ));
    assert_eq!(s.preview_size(), Some(PixelSize::new(960, 540).unwrap()));
    assert_eq!(s.reference_width(), 960);
}

#[tokio::test]
async fn corrupt_upload_is_stored_as_failed_and_cannot_export() {
    let mut s = session();
    let err = s
        .load_image("broken.jpg", vec![0xff, 0xd8, 0x00, 0x01])
        .await
        .unwrap_err();
    assert!(err.requires_reupload());
    assert!(matches!(
        s.image().unwrap().status(),
        DecodeStatus::Failed(_)
    ));

    let host = DownloadHost::default();
    let err = s.export(&host).await.unwrap_err();
    assert!(matches!(err, RetouchError::Decode(_)));
    assert!(host.downloads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn export_without_an_image_is_rejected() {
    let mut s = session();
    assert!(matches!(
        s.begin_export(),
        Err(RetouchError::Validation(_))
    ));
}

#[tokio::test]
async fn export_encodes_at_natural_size_and_downloads() {
    let mut s = session();
    s.load_image("holiday.png", png_bytes(400, 300, [200, 120, 40, 255]))
        .await
        .unwrap();
    s.edit_mut().select_filter("noir").unwrap();

    let host = DownloadHost::default();
    let report = s.export(&host).await.unwrap();
    assert_eq!(report.strategy, "direct-redraw");
    assert_eq!(report.size, PixelSize::new(400, 300).unwrap());
    assert_eq!(report.artifact.filename, "holiday-edited.jpg");
    assert_eq!(report.artifact.mime, "image/jpeg");
    assert_eq!(report.delivery.outcome, DeliveryOutcome::Downloaded);
    assert_eq!(report.delivery.tier, DeliveryTier::Download);
    assert_eq!(*host.downloads.lock().unwrap(), vec!["holiday-edited.jpg"]);
    assert_eq!(s.blobs().live_count(), 0);
}

#[tokio::test]
async fn unreadable_source_falls_back_to_the_snapshot() {
    let mut s = session();
    let pixels = match ImageAsset::decode("remote.png", &png_bytes(300, 200, [90, 90, 90, 255]))
        .status()
    {
        DecodeStatus::Decoded(p) => p.clone(),
        other => panic!("unexpected status {other:?}"),
    };
    s.set_image(ImageAsset::from_pixels("remote.png", pixels).with_pixel_read(false));

    let report = s.export(&DownloadHost::default()).await.unwrap();
    assert_eq!(report.strategy, "surface-snapshot");
    assert_eq!(report.capture_failures.len(), 1);
    assert_eq!(report.capture_failures[0].0, "direct-redraw");
    // Desktop snapshots render the 300x200 preview at twice its size.
    assert_eq!(report.size, PixelSize::new(600, 400).unwrap());
}

#[tokio::test]
async fn only_one_export_may_be_in_flight() {
    let mut s = session();
    s.load_image("a.png", png_bytes(8, 8, [1, 2, 3, 255]))
        .await
        .unwrap();
    let job = s.begin_export().unwrap();
    assert!(matches!(
        s.begin_export(),
        Err(RetouchError::Validation(_))
    ));
    drop(job);
    assert!(s.begin_export().is_ok());
}

#[tokio::test]
async fn export_job_keeps_the_edit_it_started_with() {
    let mut s = session();
    s.load_image("a.png", png_bytes(8, 8, [1, 2, 3, 255]))
        .await
        .unwrap();
    s.edit_mut().select_filter("vintage").unwrap();
    let job = s.begin_export().unwrap();
    s.edit_mut().select_filter("noir").unwrap();
    assert_eq!(job.edit().filter_id(), "vintage");
    assert_eq!(s.edit().filter_id(), "noir");
    assert_ne!(job.edit(), &EditState::new());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn replacing_the_image_invalidates_an_export_in_flight() {
    let mut s = session();
    s.load_image("first.png", png_bytes(16, 16, [50, 50, 50, 255]))
        .await
        .unwrap();
    let (tx, rx) = mpsc::channel();
    let job = s
        .begin_export()
        .unwrap()
        .with_strategies(vec![Box::new(Gate(Mutex::new(rx)))]);
    let host = std::sync::Arc::new(DownloadHost::default());
    let run = tokio::spawn({
        let host = host.clone();
        async move { job.run(host.as_ref()).await }
    });

    s.load_image("second.png", png_bytes(16, 16, [9, 9, 9, 255]))
        .await
        .unwrap();
    // The job may already have bailed out and dropped the gate.
    let _ = tx.send(());

    let err = run.await.unwrap().unwrap_err();
    assert!(matches!(err, RetouchError::Invalidated));
    assert!(host.downloads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_options_are_rejected_up_front() {
    let opts = RetouchOpts {
        jpeg_quality: 2.0,
        ..RetouchOpts::default()
    };
    assert!(EditorSession::new(opts, FontBook::new()).is_err());
}
