use super::*;

#[test]
fn defaults_match_the_editor() {
    let s = EditState::new();
    assert_eq!(s.filter_id(), "none");
    assert_eq!(s.intensity(), 100.0);
    assert!(s.effects().is_empty());
    assert_eq!(s.text().content, "Your Text");
    assert_eq!(s.text().color, Rgb8::WHITE);
    assert_eq!(s.text().font, FontId::Inter);
    assert_eq!(s.text().size_px, 50.0);
    assert!(s.channel_values().is_identity());
}

#[test]
fn intensity_domain_is_enforced_at_the_setter() {
    let mut s = EditState::new();
    s.set_intensity(150.0).unwrap();
    s.set_intensity(0.0).unwrap();
    assert!(s.set_intensity(150.5).is_err());
    assert!(s.set_intensity(-1.0).is_err());
    assert!(s.set_intensity(f64::NAN).is_err());
    assert_eq!(s.intensity(), 0.0);
}

#[test]
fn unknown_filters_are_rejected() {
    let mut s = EditState::new();
    assert!(s.select_filter("sparkle").is_err());
    s.select_filter("noir").unwrap();
    assert_eq!(s.channel_values().grayscale, 100.0);
}

#[test]
fn toggling_effects_is_set_semantics() {
    let mut s = EditState::new();
    s.toggle_effect(EffectId::Grain);
    let before = s.clone();
    assert!(s.toggle_effect(EffectId::Vignette));
    assert!(!s.toggle_effect(EffectId::Vignette));
    assert_eq!(s, before);
}

#[test]
fn snapshot_is_independent_of_later_edits() {
    let mut live = EditState::new();
    live.select_filter("vintage").unwrap();
    let snapshot = live.clone();
    live.select_filter("noir").unwrap();
    live.set_text("changed");
    assert_eq!(snapshot.filter_id(), "vintage");
    assert_eq!(snapshot.text().content, "Your Text");
}

#[test]
fn text_size_scales_linearly_with_ratio() {
    let t = TextSpec::default();
    assert_eq!(t.scaled_size(1.0), 50.0);
    assert_eq!(t.scaled_size(2.0), 100.0);
    assert_eq!(t.scaled_size(0.5), 25.0);
}

#[test]
fn font_ids_parse_case_insensitively() {
    assert_eq!("bebasneue".parse::<FontId>().unwrap(), FontId::BebasNeue);
    assert_eq!("specialElite".parse::<FontId>().unwrap(), FontId::SpecialElite);
    assert!("comic".parse::<FontId>().is_err());
}

#[test]
fn edit_state_roundtrips_through_json_and_validates() {
    let mut s = EditState::new();
    s.select_filter("daydream").unwrap();
    s.set_intensity(120.0).unwrap();
    s.toggle_effect(EffectId::Dust);
    s.set_text_color_hex("#ff0000").unwrap();

    let json = serde_json::to_string(&s).unwrap();
    let back: EditState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
    back.validate().unwrap();

    let partial: EditState = serde_json::from_str(r#"{"filter_id": "noir"}"#).unwrap();
    assert_eq!(partial.filter_id(), "noir");
    assert_eq!(partial.text(), &TextSpec::default());
}

#[test]
fn deserializing_rejects_values_the_setters_reject() {
    for json in [
        r#"{"intensity": 1e6}"#,
        r#"{"intensity": -1}"#,
        r#"{"filter_id": "sparkle"}"#,
        r#"{"text": {"size_px": 0}}"#,
    ] {
        let err = serde_json::from_str::<EditState>(json).unwrap_err();
        assert!(err.to_string().contains("validation"), "{json}: {err}");
    }
}
