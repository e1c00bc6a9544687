//! Catalog resolution tests

use butler::catalog::loader::parse_catalog;
use butler::catalog::{DeviceCatalog, DeviceRecord, InMemoryCatalog};

fn catalog(names: &[&str]) -> InMemoryCatalog {
    InMemoryCatalog::new(
        names
            .iter()
            .map(|name| DeviceRecord::new(*name, format!("id-{}", name), "control/x", vec![])),
    )
}

#[test]
fn test_longest_key_wins() {
    let catalog = catalog(&["A", "AB", "ABC"]);
    assert_eq!(catalog.resolve("please run ABC now").unwrap().name, "ABC");
    assert_eq!(catalog.resolve("please run AB now").unwrap().name, "AB");
}

#[test]
fn test_exact_key_resolves_identically() {
    let catalog = InMemoryCatalog::demo();
    let first = catalog.resolve("開啟會議室冷氣").unwrap();
    let second = catalog.resolve("開啟會議室冷氣").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.device_id, "mock-device-123");
}

#[test]
fn test_not_found_lists_names_verbatim() {
    let catalog = parse_catalog(
        r#"[
            {"設備": "開啟會議室冷氣", "deviceID": "d1", "path": "control/ac", "related_devices": "d2"},
            {"設備": "關閉會議室冷氣", "deviceID": "d1", "path": "control/ac_off", "related_devices": ""},
            {"設備": "Open Garage", "deviceID": "d3", "path": "control/garage", "related_devices": ""}
        ]"#,
    )
    .unwrap();

    let err = catalog.resolve("開啟除濕機").unwrap_err();
    assert_eq!(err.available_names, vec!["開啟會議室冷氣", "關閉會議室冷氣", "Open Garage"]);
}

#[test]
fn test_dispatcher_payload() {
    let catalog = InMemoryCatalog::demo();
    let record = catalog
        .resolve(r#"{"message": "請幫我開啟會議室冷氣", "user": "u-1"}"#)
        .unwrap();
    assert_eq!(record.name, "開啟會議室冷氣");
}
