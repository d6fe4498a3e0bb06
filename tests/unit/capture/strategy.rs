use super::*;
use crate::assets::image::DecodedPixels;
use crate::foundation::core::PixelSize;
use crate::render::preview::LiveView;

fn solid_image(w: u32, h: u32, px: [u8; 4]) -> Arc<ImageAsset> {
    Arc::new(ImageAsset::from_pixels(
        "solid.png",
        DecodedPixels {
            size: PixelSize::new(w, h).unwrap(),
            rgba8_premul: Arc::new(px.repeat((w * h) as usize)),
        },
    ))
}

fn request(image: Arc<ImageAsset>, with_view: bool) -> CaptureRequest {
    let mut edit = EditState::new();
    edit.set_text("");
    edit.select_filter("noir").unwrap();
    let fonts = Arc::new(FontBook::new());
    let preview_box = PixelSize::new(50, 50).unwrap();
    let view = if with_view {
        let mut live = LiveView::new(fonts.clone());
        live.render(&image, &edit, preview_box).unwrap();
        live.tree()
    } else {
        None
    };
    let reference_width = image
        .size()
        .map(|s| s.fit_within(preview_box).width)
        .unwrap_or(preview_box.width);
    CaptureRequest {
        image,
        edit,
        fonts,
        view,
        reference_width,
    }
}

#[test]
fn direct_redraw_renders_at_natural_resolution() {
    let req = request(solid_image(120, 80, [200, 100, 50, 255]), false);
    let surface = DirectRedraw.capture(&req).unwrap();
    assert_eq!(surface.size(), PixelSize::new(120, 80).unwrap());
    let px = surface.pixel(60, 40).unwrap();
    assert_eq!((px[0], px[3]), (px[2], 255));
}

#[test]
fn direct_redraw_refuses_unreadable_sources() {
    let image = Arc::new(
        ImageAsset::from_pixels(
            "remote.png",
            DecodedPixels {
                size: PixelSize::new(4, 4).unwrap(),
                rgba8_premul: Arc::new(vec![255; 64]),
            },
        )
        .with_pixel_read(false),
    );
    let err = DirectRedraw.capture(&request(image, false)).unwrap_err();
    assert!(matches!(err, RetouchError::Capture(_)));
}

#[test]
fn direct_redraw_surfaces_decode_failures() {
    let image = Arc::new(ImageAsset::decode("bad.jpg", b"garbage"));
    let err = DirectRedraw.capture(&request(image, false)).unwrap_err();
    assert!(err.requires_reupload());
}

#[test]
fn snapshot_uses_the_retained_view_at_scale() {
    let req = request(solid_image(120, 80, [200, 100, 50, 255]), true);
    let surface = SurfaceSnapshot::new(2.0, Rgb8::new(17, 17, 17))
        .capture(&req)
        .unwrap();
    // Preview is 50x33 inside a 50x50 box.
    assert_eq!(surface.size(), PixelSize::new(100, 66).unwrap());
    let px = surface.pixel(50, 33).unwrap();
    assert_eq!(px[3], 255);
    assert!((i16::from(px[0]) - i16::from(px[2])).abs() <= 2);
}

#[test]
fn snapshot_without_view_fails() {
    let req = request(solid_image(10, 10, [1, 1, 1, 255]), false);
    assert!(SurfaceSnapshot::new(1.0, Rgb8::BLACK).capture(&req).is_err());
}
