use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn normal_cdf_matches_reference_points() {
    assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
    assert!((normal_cdf(1.0) - 0.841_344_7).abs() < 1e-6);
    assert!((normal_cdf(-1.96) - 0.024_997_9).abs() < 1e-6);
    assert!(normal_cdf(8.0) > 0.999_999);
    assert!(normal_cdf(-8.0) < 1e-6);
}

#[test]
fn unit_to_u8_rounds_and_saturates() {
    assert_eq!(unit_to_u8(-0.5), 0);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(unit_to_u8(2.0), 255);
}
