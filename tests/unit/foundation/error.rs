use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VeneerError::conversion("x")
            .to_string()
            .contains("conversion error:")
    );
    assert!(VeneerError::render("x").to_string().contains("render error:"));
    assert!(VeneerError::config("x").to_string().contains("config error:"));
    assert!(
        VeneerError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VeneerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: VeneerError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, VeneerError::Serde(_)));
}
