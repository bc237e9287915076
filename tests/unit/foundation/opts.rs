use super::*;

#[test]
fn empty_document_yields_defaults() {
    let cfg = VeneerConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, VeneerConfig::default());
    assert_eq!(cfg.callbacks.capacity, 1024);
    assert_eq!(cfg.callbacks.max_lifetime, Duration::from_secs(86_400));
    assert_eq!(cfg.callbacks.sweep_interval, Duration::from_secs(30));
    assert_eq!(cfg.mirror.min_progress_delta, 5e-4);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = VeneerConfig::from_json_str(r#"{"callbacks":{"capacity":16},"mirror":{"min_progress_delta":0.01}}"#)
        .unwrap();
    assert_eq!(cfg.callbacks.capacity, 16);
    assert_eq!(
        cfg.callbacks.max_lifetime,
        CallbackStoreOpts::DEFAULT_MAX_LIFETIME
    );
    assert_eq!(cfg.mirror.min_progress_delta, 0.01);
}

#[test]
fn invalid_values_are_rejected() {
    let err = VeneerConfig::from_json_str(r#"{"callbacks":{"capacity":0}}"#).unwrap_err();
    assert!(matches!(err, VeneerError::Config(_)));

    let err = VeneerConfig::from_json_str(r#"{"mirror":{"min_progress_delta":-1.0}}"#)
        .unwrap_err();
    assert!(matches!(err, VeneerError::Config(_)));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = VeneerConfig::from_json_str("{").unwrap_err();
    assert!(matches!(err, VeneerError::Serde(_)));
}
