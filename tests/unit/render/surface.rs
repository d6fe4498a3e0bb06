use super::*;

fn size(w: u32, h: u32) -> PixelSize {
    PixelSize::new(w, h).unwrap()
}

#[test]
fn new_surface_is_blank_and_filled_is_not() {
    assert!(Surface::new(size(3, 2)).is_blank());
    let s = Surface::filled(size(3, 2), Rgb8::new(17, 17, 17));
    assert!(!s.is_blank());
    assert_eq!(s.pixel(2, 1), Some([17, 17, 17, 255]));
    assert_eq!(s.pixel(3, 0), None);
}

#[test]
fn from_premul_bytes_checks_length() {
    assert!(Surface::from_premul_bytes(size(2, 2), vec![0; 15]).is_err());
    assert!(Surface::from_premul_bytes(size(2, 2), vec![0; 16]).is_ok());
}

#[test]
fn straight_conversion_undoes_premultiplication() {
    let s = Surface::from_premul_bytes(size(2, 1), vec![64, 32, 0, 128, 10, 20, 30, 255]).unwrap();
    let straight = s.to_straight_rgba8();
    assert_eq!(&straight[0..4], &[128, 64, 0, 128]);
    assert_eq!(&straight[4..8], &[10, 20, 30, 255]);
}

#[test]
fn pixmap_roundtrip_preserves_bytes() {
    let s = Surface::from_premul_bytes(size(2, 1), vec![1, 2, 3, 4, 50, 60, 70, 255]).unwrap();
    let pm = pixmap_from_premul_bytes(s.data(), 2, 1).unwrap();
    assert_eq!(Surface::from_pixmap(&pm).unwrap(), s);
}

#[test]
fn oversized_pixmaps_are_rejected() {
    assert!(pixmap_dims(70_000, 1).is_err());
    assert_eq!(pixmap_dims(640, 480).unwrap(), (640, 480));
}
