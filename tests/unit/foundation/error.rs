use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RetouchError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        RetouchError::decode("x")
            .to_string()
            .contains("decode failure:")
    );
    assert!(
        RetouchError::capture("x")
            .to_string()
            .contains("capture failure:")
    );
    assert!(
        RetouchError::encode("x")
            .to_string()
            .contains("encode failure:")
    );
    assert!(
        RetouchError::delivery("x")
            .to_string()
            .contains("try saving again")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RetouchError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_decode_failures_require_reupload() {
    assert!(RetouchError::decode("bad header").requires_reupload());
    assert!(!RetouchError::capture("both failed").requires_reupload());
    assert!(!RetouchError::Invalidated.requires_reupload());
}
