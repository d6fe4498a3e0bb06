use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::assets::fonts::FontBook;
use crate::assets::image::{DecodedPixels, ImageAsset};
use crate::edit::state::EditState;
use crate::foundation::core::{PixelSize, Rgb8};

struct Failing;

impl CaptureStrategy for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn capture(&self, _req: &CaptureRequest) -> RetouchResult<Surface> {
        Err(RetouchError::capture("simulated failure"))
    }
}

struct Blank;

impl CaptureStrategy for Blank {
    fn name(&self) -> &str {
        "blank"
    }

    fn capture(&self, _req: &CaptureRequest) -> RetouchResult<Surface> {
        Ok(Surface::new(PixelSize::new(2, 2).unwrap()))
    }
}

struct Counting {
    calls: Arc<AtomicUsize>,
}

impl CaptureStrategy for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn capture(&self, _req: &CaptureRequest) -> RetouchResult<Surface> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Surface::filled(PixelSize::new(3, 3).unwrap(), Rgb8::WHITE))
    }
}

/// Blocks until released, standing in for a redraw that takes far too long.
struct Stalled(Mutex<mpsc::Receiver<()>>);

impl CaptureStrategy for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    fn capture(&self, _req: &CaptureRequest) -> RetouchResult<Surface> {
        let _ = self.0.lock().unwrap().recv_timeout(Duration::from_secs(10));
        Ok(Surface::filled(PixelSize::new(3, 3).unwrap(), Rgb8::WHITE))
    }
}

struct Panicking;

impl CaptureStrategy for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn capture(&self, _req: &CaptureRequest) -> RetouchResult<Surface> {
        panic!("renderer crashed")
    }
}

fn request() -> CaptureRequest {
    CaptureRequest {
        image: Arc::new(ImageAsset::from_pixels(
            "a.png",
            DecodedPixels {
                size: PixelSize::new(2, 2).unwrap(),
                rgba8_premul: Arc::new(vec![255; 16]),
            },
        )),
        edit: EditState::new(),
        fonts: Arc::new(FontBook::new()),
        view: None,
        reference_width: 2,
    }
}

#[test]
fn falls_through_failures_and_blank_surfaces() {
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = CapturePolicy::new(vec![
        Box::new(Failing),
        Box::new(Blank),
        Box::new(Counting {
            calls: calls.clone(),
        }),
    ]);
    let captured = policy.capture(&request()).unwrap();
    assert_eq!(captured.strategy, "counting");
    assert_eq!(captured.failures.len(), 2);
    assert_eq!(captured.failures[0].0, "failing");
    assert_eq!(captured.failures[1].0, "blank");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn stops_at_first_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = CapturePolicy::new(vec![
        Box::new(Counting {
            calls: calls.clone(),
        }),
        Box::new(Counting {
            calls: calls.clone(),
        }),
    ]);
    policy.capture(&request()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn exhausting_every_strategy_lists_each_failure() {
    let policy = CapturePolicy::new(vec![Box::new(Failing), Box::new(Blank)]);
    let err = policy.capture(&request()).unwrap_err();
    let RetouchError::Capture(msg) = err else {
        panic!("expected capture failure, got {err:?}");
    };
    assert!(msg.contains("failing: "));
    assert!(msg.contains("blank: "));
    assert!(CapturePolicy::new(Vec::new()).capture(&request()).is_err());
}

#[test]
fn standard_policy_prefers_direct_redraw() {
    let policy = CapturePolicy::standard(&RetouchOpts::default(), false);
    assert_eq!(
        policy.strategy_names(),
        vec!["direct-redraw", "surface-snapshot"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overrunning_strategy_times_out_and_the_next_one_runs() {
    let (release, rx) = mpsc::channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = CapturePolicy::new(vec![
        Box::new(Stalled(Mutex::new(rx))),
        Box::new(Counting {
            calls: calls.clone(),
        }),
    ])
    .with_strategy_timeout(Duration::from_millis(50));

    let captured = policy.capture_within(request()).await.unwrap();
    let _ = release.send(());

    assert_eq!(captured.strategy, "counting");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(captured.failures.len(), 1);
    assert_eq!(captured.failures[0].0, "stalled");
    assert!(captured.failures[0].1.contains("within 50 ms"), "{:?}", captured.failures);
}

#[tokio::test]
async fn crashed_strategy_falls_through_to_the_next() {
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = CapturePolicy::new(vec![
        Box::new(Panicking),
        Box::new(Counting {
            calls: calls.clone(),
        }),
    ]);
    let captured = policy.capture_within(request()).await.unwrap();
    assert_eq!(captured.strategy, "counting");
    assert_eq!(captured.failures[0].0, "panicking");
}

#[tokio::test]
async fn every_strategy_timing_out_is_a_capture_error() {
    let (release, rx) = mpsc::channel();
    let policy = CapturePolicy::new(vec![Box::new(Stalled(Mutex::new(rx)))])
        .with_strategy_timeout(Duration::from_millis(20));
    let err = policy.capture_within(request()).await.unwrap_err();
    let _ = release.send(());
    let RetouchError::Capture(msg) = err else {
        panic!("expected capture failure, got {err:?}");
    };
    assert!(msg.starts_with("stalled: "), "{msg}");
}

#[test]
fn standard_policy_bounds_each_strategy_by_the_stage_timeout() {
    let opts = RetouchOpts {
        stage_timeout_ms: 1_500,
        ..RetouchOpts::default()
    };
    let policy = CapturePolicy::standard(&opts, true);
    assert_eq!(policy.strategy_timeout(), Some(Duration::from_millis(1_500)));
    assert_eq!(CapturePolicy::new(Vec::new()).strategy_timeout(), None);
}
