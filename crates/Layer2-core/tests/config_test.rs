//! Registry 설정 통합 테스트 - wheel.json 로드 및 적용

use wheel_core::{ConflictPolicy, Registry, RegistryConfig, REGISTRY_CONFIG_FILE};

#[test]
fn test_registry_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(REGISTRY_CONFIG_FILE);
    std::fs::write(
        &path,
        r#"{ "onConflict": "reject", "slotCapacity": 4, "traceEmissions": true }"#,
    )
    .unwrap();

    let config = RegistryConfig::load_optional(&path).unwrap().unwrap();
    assert_eq!(config.on_conflict, ConflictPolicy::Reject);

    let registry = Registry::with_config(config);
    let event = registry.create::<fn(u8)>("configured").unwrap();
    event.on(|_: u8| {}).unwrap();
    event.emit((1u8,)).unwrap();

    let err = registry.create::<fn()>("configured").unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = RegistryConfig::load_optional(dir.path().join(REGISTRY_CONFIG_FILE))
        .unwrap()
        .unwrap_or_default();

    let registry = Registry::with_config(config);
    let first = registry.create::<fn()>("loose").unwrap();
    let second = registry.create::<fn(u8)>("loose").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn test_saved_config_round_trips_through_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".wheel").join(REGISTRY_CONFIG_FILE);

    let config = RegistryConfig::new().with_slot_capacity(64);
    config.save(&path).unwrap();

    let registry = Registry::with_config(RegistryConfig::load(&path).unwrap());
    assert_eq!(registry.config().slot_capacity, 64);
    assert_eq!(registry.config().on_conflict, ConflictPolicy::Keep);
}
