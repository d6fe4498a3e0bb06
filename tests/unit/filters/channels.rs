use super::*;
use crate::filters::catalog::{filters, find_filter};

#[test]
fn intensity_zero_yields_baseline_for_every_filter() {
    for f in filters() {
        assert_eq!(
            compute_channel_values(f, INTENSITY_MIN),
            ChannelValues::BASELINE,
            "filter {}",
            f.id
        );
    }
}

#[test]
fn intensity_nominal_reaches_targets_exactly() {
    for f in filters() {
        let v = compute_channel_values(f, INTENSITY_NOMINAL);
        for c in Channel::ALL {
            let expected = f.target(c).unwrap_or(c.baseline());
            assert_eq!(v.get(c), expected, "filter {} channel {c}", f.id);
        }
    }
}

#[test]
fn intensity_max_extrapolates_past_target() {
    for f in filters() {
        let v = compute_channel_values(f, INTENSITY_MAX);
        for c in Channel::ALL {
            let b = c.baseline();
            let expected = match f.target(c) {
                Some(t) => b + 1.5 * (t - b),
                None => b,
            };
            assert_eq!(v.get(c), expected, "filter {} channel {c}", f.id);
        }
    }

    let noir = compute_channel_values(find_filter("noir").unwrap(), INTENSITY_MAX);
    assert_eq!(noir.contrast, 175.0);
    assert_eq!(noir.grayscale, 150.0);
    assert_eq!(noir.brightness, 85.0);
}

#[test]
fn half_intensity_is_linear_midpoint() {
    let v = compute_channel_values(find_filter("daydream").unwrap(), 50.0);
    assert_eq!(v.brightness, 105.0);
    assert_eq!(v.saturate, 115.0);
    assert_eq!(v.hue_rotate, -5.0);
    assert_eq!(v.contrast, 100.0);
}

#[test]
fn computation_is_pure() {
    let f = find_filter("midnight").unwrap();
    let a = compute_channel_values(f, 73.0);
    let _ = compute_channel_values(find_filter("noir").unwrap(), 150.0);
    let b = compute_channel_values(f, 73.0);
    assert_eq!(a, b);
}

#[test]
fn css_formatting_is_fixed_order_with_units() {
    let v = compute_channel_values(find_filter("noir").unwrap(), 100.0);
    assert_eq!(
        v.to_css_filter(),
        "brightness(90%) contrast(150%) saturate(100%) grayscale(100%) sepia(0%) hue-rotate(0deg)"
    );

    let blurred = ChannelValues {
        blur: 2.5,
        ..ChannelValues::BASELINE
    };
    assert!(blurred.to_css_filter().ends_with("blur(2.5px)"));
    assert_eq!(css_filter_for(find_filter("none").unwrap(), 100.0), "none");
}

#[test]
fn scaling_only_touches_blur() {
    let v = ChannelValues {
        brightness: 90.0,
        blur: 3.0,
        ..ChannelValues::BASELINE
    };
    let s = v.scaled_for(2.0);
    assert_eq!(s.blur, 6.0);
    assert_eq!(s.brightness, 90.0);
}

#[test]
fn serde_uses_camel_case_field_names() {
    let json = serde_json::to_value(ChannelValues::BASELINE).unwrap();
    assert_eq!(json["hueRotate"], 0.0);
    assert_eq!(json["saturate"], 100.0);
}
