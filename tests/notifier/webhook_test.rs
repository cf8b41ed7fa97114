//! Webhook delivery against a local HTTP endpoint.

use log_watcher::notifier::{Notification, Notifier, NotifyError, Recipients, WebhookNotifier};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one request, answer with `status`, and return the request body.
async fn one_shot_server(status: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/alerts", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let (header_end, content_length) = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                break (pos + 4, length);
            }
        };
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!("HTTP/1.1 {status}\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope");
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap()
    });

    (url, handle)
}

fn notification() -> Notification {
    Notification {
        recipients: Recipients {
            to: vec!["ops@example.com".to_string()],
            cc: vec!["dev@example.com".to_string()],
            from: "watcher@example.com".to_string(),
        },
        subject: "Following logs were captured".to_string(),
        body: "java.lang.NullPointerException\n\tat A\n".to_string(),
    }
}

#[tokio::test]
async fn webhook_posts_json_payload() {
    let (url, server) = one_shot_server("200 OK").await;
    let notifier = WebhookNotifier::new(&url).unwrap();

    tokio_test::assert_ok!(notifier.deliver(&notification()).await);

    let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(body["to"][0], "ops@example.com");
    assert_eq!(body["cc"][0], "dev@example.com");
    assert_eq!(body["from"], "watcher@example.com");
    assert_eq!(body["subject"], "Following logs were captured");
    assert_eq!(body["body"], "java.lang.NullPointerException\n\tat A\n");
}

#[tokio::test]
async fn webhook_non_success_is_rejected() {
    let (url, server) = one_shot_server("503 Service Unavailable").await;
    let notifier = WebhookNotifier::new(&url).unwrap();

    let err = notifier.deliver(&notification()).await.unwrap_err();
    server.await.unwrap();

    match err {
        NotifyError::Rejected { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn webhook_unreachable_endpoint_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/alerts", listener.local_addr().unwrap());
    drop(listener);

    let notifier = WebhookNotifier::new(&url).unwrap();
    let err = notifier.deliver(&notification()).await.unwrap_err();
    assert!(matches!(err, NotifyError::RequestFailed(_) | NotifyError::Timeout));
}
