use super::*;

#[test]
fn catalog_ids_are_unique_and_none_is_first() {
    let ids: Vec<_> = filters().iter().map(|f| f.id).collect();
    assert_eq!(ids[0], NONE_FILTER_ID);
    let mut dedup = ids.clone();
    dedup.sort_unstable();
    dedup.dedup();
    assert_eq!(dedup.len(), ids.len());
}

#[test]
fn noir_targets_match_preset() {
    let noir = find_filter("noir").unwrap();
    assert_eq!(noir.target(Channel::Grayscale), Some(100.0));
    assert_eq!(noir.target(Channel::Contrast), Some(150.0));
    assert_eq!(noir.target(Channel::Brightness), Some(90.0));
    assert_eq!(noir.target(Channel::Sepia), None);
    assert_eq!(noir.target(Channel::Blur), None);
}

#[test]
fn no_filter_defines_a_channel_twice() {
    for f in filters() {
        for c in Channel::ALL {
            let n = f.targets.iter().filter(|(tc, _)| *tc == c).count();
            assert!(n <= 1, "{} defines {c} {n} times", f.id);
        }
    }
}

#[test]
fn unknown_ids_resolve_to_none() {
    assert!(find_filter("sparkle").is_none());
    assert!(resolve_filter("sparkle").is_none());
    assert_eq!(resolve_filter("vintage").name, "Vintage");
}

#[test]
fn channel_baselines_and_units() {
    assert_eq!(Channel::Brightness.baseline(), 100.0);
    assert_eq!(Channel::Saturate.baseline(), 100.0);
    assert_eq!(Channel::Grayscale.baseline(), 0.0);
    assert_eq!(Channel::HueRotate.unit(), ChannelUnit::Degrees);
    assert_eq!(Channel::Blur.unit(), ChannelUnit::Pixels);
    assert_eq!(Channel::Sepia.unit().suffix(), "%");
}

#[test]
fn channel_serde_accepts_css_names() {
    let c: Channel = serde_json::from_str("\"hue-rotate\"").unwrap();
    assert_eq!(c, Channel::HueRotate);
    let c: Channel = serde_json::from_str("\"saturation\"").unwrap();
    assert_eq!(c, Channel::Saturate);
}
