//! Device commands against a live HTTP backend

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use butler::backend::http::HttpBackend;
use butler::catalog::cache::CatalogCache;
use butler::catalog::loader::StaticCatalogLoader;
use butler::catalog::InMemoryCatalog;
use butler::engine::evaluator::{DependencyFault, ProbeMode};
use butler::engine::manager::DeviceManager;
use butler::storage::settings::BackendSettings;

const BAD_GATEWAY_PAGE: &str = "<html>\r\n<head><title>502 Bad Gateway</title></head>\r\n<body>\r\n<center><h1>502 Bad Gateway</h1></center>\r\n<hr><center>nginx/1.25.3</center>\r\n</body>\r\n</html>\r\n";

/// Serve `count` requests, one connection each, answering by request line
fn serve(count: usize, respond: fn(&str) -> (&'static str, &'static str)) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut request_lines = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let request = String::from_utf8_lossy(&request).into_owned();
            let line = request.lines().next().unwrap_or_default().to_string();

            let (status_line, body) = respond(&line);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request_lines.push(line);
        }
        request_lines
    });

    (format!("http://{}/api", addr), handle)
}

#[tokio::test]
async fn test_proxy_error_page_keeps_one_item_per_line() {
    let (base_url, server) = serve(2, |line| {
        if line.contains("mock-device-789") {
            ("502 Bad Gateway", BAD_GATEWAY_PAGE)
        } else {
            ("200 OK", r#"{"state":"on","attributes":{"friendly_name":"Fan"}}"#)
        }
    });

    let backend = HttpBackend::new(&BackendSettings {
        base_url,
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap();
    let cache = Arc::new(CatalogCache::new(
        Arc::new(StaticCatalogLoader::new(InMemoryCatalog::demo())),
        true,
    ));
    let manager = DeviceManager::new(cache, Arc::new(backend), ProbeMode::Sequential);

    let report = manager.manage_device("開啟會議室冷氣").await.unwrap();

    assert!(!report.can_activate);
    assert_eq!(
        report.blocked_by(),
        vec![("mock-device-789", DependencyFault::ProbeFailed)]
    );
    assert_eq!(
        report.ordered_messages,
        vec![
            "設備 'Fan' (ID: mock-device-456) 狀態: 開啟, 在線, 最後更新: 最近".to_string(),
            "錯誤: 無法獲取設備 'mock-device-789' 的狀態: 502: Bad Gateway".to_string(),
            "部分關聯設備狀態正常，開啟會議室冷氣無法安全執行".to_string(),
            "由於部分相關設備狀態異常，未執行 開啟會議室冷氣 的操作".to_string(),
        ]
    );
    assert_eq!(report.render().lines().count(), 4 + report.ordered_messages.len());

    assert_eq!(
        server.join().unwrap(),
        vec![
            "GET /api/states/mock-device-456 HTTP/1.1",
            "GET /api/states/mock-device-789 HTTP/1.1",
        ]
    );
}
