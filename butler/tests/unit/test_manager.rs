//! End-to-end device command tests

use std::sync::Arc;

use chrono::{Duration, Utc};

use butler::backend::mock::{MockBackend, MockCall, MockStatus};
use butler::catalog::cache::CatalogCache;
use butler::catalog::loader::StaticCatalogLoader;
use butler::catalog::{DeviceRecord, InMemoryCatalog};
use butler::engine::evaluator::{DependencyFault, ProbeMode};
use butler::engine::fsm::ActivationState;
use butler::engine::manager::DeviceManager;
use butler::errors::{BackendError, ManageError};

const AC: &str = "開啟會議室冷氣";

fn manager(backend: Arc<MockBackend>, mode: ProbeMode) -> DeviceManager {
    manager_with(InMemoryCatalog::demo(), backend, mode)
}

fn manager_with(catalog: InMemoryCatalog, backend: Arc<MockBackend>, mode: ProbeMode) -> DeviceManager {
    let cache = Arc::new(CatalogCache::new(
        Arc::new(StaticCatalogLoader::new(catalog)),
        true,
    ));
    DeviceManager::new(cache, backend, mode)
}

#[tokio::test]
async fn test_demo_scenario_activates() {
    let backend = Arc::new(
        MockBackend::new()
            .with_status("mock-device-456", MockStatus::on().updated_secs_ago(30))
            .with_status("mock-device-789", MockStatus::off().updated_secs_ago(45)),
    );
    let report = manager(backend.clone(), ProbeMode::Sequential)
        .manage_device(AC)
        .await
        .unwrap();

    assert!(report.can_activate);
    assert_eq!(report.final_state(), ActivationState::Activated);
    assert_eq!(
        backend.calls(),
        vec![
            MockCall::GetState {
                device_id: "mock-device-456".to_string()
            },
            MockCall::GetState {
                device_id: "mock-device-789".to_string()
            },
            MockCall::Activate {
                device_id: "mock-device-123".to_string(),
                control_path: "control/ac".to_string(),
            },
        ]
    );

    let text = report.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "設備：開啟會議室冷氣",
            "狀態：可以執行",
            "",
            "詳細信息：",
            "設備 'mock-device-456' (ID: mock-device-456) 狀態: 開啟, 在線, 最後更新: 最近",
            "設備 'mock-device-789' (ID: mock-device-789) 狀態: 關閉, 在線, 最後更新: 最近",
            "所有關聯設備狀態正常，開啟會議室冷氣可以安全執行",
            "成功執行操作: 開啟會議室冷氣",
        ]
    );
}

#[tokio::test]
async fn test_probe_transport_error_blocks_activation() {
    let backend = Arc::new(
        MockBackend::new()
            .with_status("mock-device-456", MockStatus::on())
            .with_status_error("mock-device-789", BackendError::transport("connection timed out")),
    );
    let report = manager(backend.clone(), ProbeMode::Sequential)
        .manage_device(AC)
        .await
        .unwrap();

    assert!(!report.can_activate);
    assert!(!report.outcome.attempted);
    assert_eq!(backend.activation_count(), 0);
    assert_eq!(
        report.blocked_by(),
        vec![("mock-device-789", DependencyFault::ProbeFailed)]
    );
    assert_eq!(
        report.ordered_messages,
        vec![
            "設備 'mock-device-456' (ID: mock-device-456) 狀態: 開啟, 在線, 最後更新: 最近".to_string(),
            "錯誤: 無法獲取設備 'mock-device-789' 的狀態: connection timed out".to_string(),
            "部分關聯設備狀態正常，開啟會議室冷氣無法安全執行".to_string(),
            "由於部分相關設備狀態異常，未執行 開啟會議室冷氣 的操作".to_string(),
        ]
    );
    assert!(report.render().starts_with("設備：開啟會議室冷氣\n狀態：無法執行\n\n詳細信息：\n"));
}

#[tokio::test]
async fn test_any_unhealthy_dependency_blocks() {
    let unhealthy = [
        MockStatus::with_state("unavailable"),
        MockStatus::on().updated_secs_ago(300),
        MockStatus::off().updated_secs_ago(3600),
    ];

    for status in unhealthy {
        let backend = Arc::new(
            MockBackend::new()
                .with_status("mock-device-456", MockStatus::on())
                .with_status("mock-device-789", status),
        );
        let report = manager(backend.clone(), ProbeMode::Concurrent)
            .manage_device(AC)
            .await
            .unwrap();

        assert!(!report.can_activate);
        assert_eq!(report.verdicts.len(), 2);
        assert_eq!(backend.activation_count(), 0);
    }
}

#[tokio::test]
async fn test_every_dependency_probed_after_failure() {
    let catalog = InMemoryCatalog::new([DeviceRecord::new(
        "pump",
        "pump-1",
        "control/pump",
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
    )]);
    let backend = Arc::new(
        MockBackend::new()
            .with_status_error("a", BackendError::status(500, "boom"))
            .with_status("b", MockStatus::on())
            .with_status("c", MockStatus::with_state("unknown")),
    );

    let report = manager_with(catalog, backend.clone(), ProbeMode::Sequential)
        .manage_device("start the pump")
        .await
        .unwrap();

    assert_eq!(backend.calls().len(), 3);
    assert_eq!(report.ordered_messages.len(), 5);
    assert_eq!(
        report.blocked_by(),
        vec![("a", DependencyFault::ProbeFailed), ("c", DependencyFault::Offline)]
    );
}

#[tokio::test]
async fn test_device_without_dependencies() {
    let backend = Arc::new(MockBackend::new());
    let report = manager(backend.clone(), ProbeMode::Sequential)
        .manage_device("mock-device-456")
        .await
        .unwrap();

    assert!(report.can_activate);
    assert!(report.verdicts.is_empty());
    assert_eq!(backend.activation_count(), 1);
}

#[tokio::test]
async fn test_activation_failure_is_reported() {
    let backend = Arc::new(
        MockBackend::demo().with_activation_error("mock-device-123", BackendError::status(502, "Bad Gateway")),
    );
    let report = manager(backend.clone(), ProbeMode::Sequential)
        .manage_device(AC)
        .await
        .unwrap();

    assert!(report.can_activate);
    assert_eq!(report.outcome.succeeded, Some(false));
    assert_eq!(report.final_state(), ActivationState::ActivationFailed);
    assert_eq!(
        report.ordered_messages.last().map(String::as_str),
        Some("執行操作 開啟會議室冷氣 時發生錯誤: 502: Bad Gateway")
    );
    assert_eq!(backend.activation_count(), 1);
}

#[tokio::test]
async fn test_unparsable_last_updated_blocks_activation() {
    let backend = Arc::new(
        MockBackend::new()
            .with_status("mock-device-456", MockStatus::on())
            .with_status("mock-device-789", MockStatus::on().updated_at("yesterday")),
    );
    let report = manager(backend.clone(), ProbeMode::Sequential)
        .manage_device(AC)
        .await
        .unwrap();

    assert!(!report.can_activate);
    assert_eq!(backend.activation_count(), 0);
    assert_eq!(
        report.blocked_by(),
        vec![("mock-device-789", DependencyFault::ProbeFailed)]
    );
    assert_eq!(
        report.ordered_messages[1],
        "錯誤: 無法獲取設備 'mock-device-789' 的狀態: invalid last_updated timestamp 'yesterday'"
    );
}

#[tokio::test]
async fn test_offset_less_last_updated_read_as_utc() {
    let fresh = (Utc::now() - Duration::seconds(20))
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    let backend = Arc::new(
        MockBackend::new()
            .with_status("mock-device-456", MockStatus::on().updated_at(fresh))
            .with_status("mock-device-789", MockStatus::off().updated_at("2000-01-01T00:00:00")),
    );
    let report = manager(backend.clone(), ProbeMode::Sequential)
        .manage_device(AC)
        .await
        .unwrap();

    assert!(report.verdicts[0].is_healthy);
    assert!(!report.verdicts[1].is_recent);
    assert_eq!(
        report.blocked_by(),
        vec![("mock-device-789", DependencyFault::Stale)]
    );
    assert_eq!(report.outcome.blocked_by, vec![DependencyFault::Stale]);
    assert_eq!(backend.activation_count(), 0);
}

#[test]
fn test_unknown_device_returns_catalog_listing() {
    let backend = Arc::new(MockBackend::demo());
    let manager = manager(backend.clone(), ProbeMode::Sequential);

    let result = tokio_test::block_on(manager.manage_device("開啟除濕機"));
    match result {
        Err(ManageError::NotFound(err)) => {
            assert_eq!(err.available_names, vec![AC, "mock-device-456", "mock-device-789"]);
            assert_eq!(
                err.to_string(),
                "錯誤：找不到設備 '開啟除濕機'。可用的設備包括: 開啟會議室冷氣, mock-device-456, mock-device-789"
            );
        }
        other => panic!("expected NotFound, got {:?}", other.map(|r| r.render())),
    }
    assert!(backend.calls().is_empty());
}
