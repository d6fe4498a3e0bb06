use super::*;

#[test]
fn empty_book_resolves_nothing() {
    let book = FontBook::new();
    assert!(book.is_empty());
    assert!(book.resolve(FontId::Inter).is_none());
}

#[test]
fn unregistered_font_falls_back_to_first_registered() {
    let book = FontBook::new()
        .with_font(FontId::Lobster, vec![1, 2, 3])
        .unwrap()
        .with_font(FontId::BebasNeue, vec![4, 5])
        .unwrap();

    let exact = book.resolve(FontId::BebasNeue).unwrap();
    assert!(!exact.is_fallback());
    assert_eq!(exact.bytes.as_slice(), &[4, 5]);

    let fallback = book.resolve(FontId::SpecialElite).unwrap();
    assert!(fallback.is_fallback());
    assert_eq!(fallback.used, FontId::Lobster);
}

#[test]
fn registering_twice_replaces_bytes_in_place() {
    let mut book = FontBook::new();
    book.register(FontId::Inter, vec![1]).unwrap();
    book.register(FontId::Lobster, vec![2]).unwrap();
    book.register(FontId::Inter, vec![9]).unwrap();
    assert_eq!(book.resolve(FontId::Inter).unwrap().bytes.as_slice(), &[9]);
    assert_eq!(book.resolve(FontId::BebasNeue).unwrap().used, FontId::Inter);
    assert!(book.register(FontId::Inter, Vec::new()).is_err());
}

#[test]
fn layout_rejects_bad_sizes_and_unusable_bytes() {
    let mut engine = TextLayoutEngine::new();
    let font = ResolvedFont {
        requested: FontId::Inter,
        used: FontId::Inter,
        bytes: Arc::new(b"not a font".to_vec()),
    };
    assert!(
        engine
            .layout_plain("x", &font, 0.0, TextBrushRgba8::default())
            .is_err()
    );
    assert!(
        engine
            .layout_plain("x", &font, 12.0, TextBrushRgba8::default())
            .is_err()
    );
}
