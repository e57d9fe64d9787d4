//! WebSocket connector against a local server

use codexec_transport::{HttpTransport, StreamConnector, StreamEvent, TransportError, WsConnector};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;

struct ServerReport {
    path: oneshot::Receiver<String>,
    saw_close: oneshot::Receiver<bool>,
}

/// One-connection server: answers "2+2\n" with "4\n", closes on "bye\n"
async fn spawn_repl_server() -> (String, ServerReport) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, path_rx) = oneshot::channel();
    let (close_tx, close_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_hdr_async(tcp, |req: &Request, resp: Response| {
            let _ = path_tx.send(req.uri().path().to_string());
            Ok(resp)
        })
        .await
        .unwrap();

        let (mut write, mut read) = ws.split();
        let mut saw_close = false;
        while let Some(Ok(msg)) = read.next().await {
            match msg {
                Message::Text(text) if text == "2+2\n" => {
                    write.send(Message::Text("4\n".into())).await.unwrap();
                }
                Message::Text(text) if text == "bye\n" => {
                    let _ = write.send(Message::Close(None)).await;
                }
                Message::Close(_) => {
                    saw_close = true;
                    break;
                }
                _ => {}
            }
        }
        let _ = close_tx.send(saw_close);
    });

    (
        format!("http://{}", addr),
        ServerReport {
            path: path_rx,
            saw_close: close_rx,
        },
    )
}

fn connector(server_url: &str) -> WsConnector {
    WsConnector::new(HttpTransport::new(server_url, "/api").unwrap()).with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn exchanges_frames_and_closes_from_client() {
    let (url, report) = spawn_repl_server().await;
    let mut stream = connector(&url).open("/ws/interactive/s-1").await.unwrap();

    assert_eq!(report.path.await.unwrap(), "/api/ws/interactive/s-1");

    stream.send_text("2+2\n").unwrap();
    assert_eq!(stream.recv().await, Some(StreamEvent::Message("4\n".into())));

    assert!(stream.close());
    assert!(!stream.close());

    let saw_close = tokio::time::timeout(Duration::from_secs(5), report.saw_close)
        .await
        .unwrap()
        .unwrap();
    assert!(saw_close);
}

#[tokio::test]
async fn remote_close_is_reported() {
    let (url, _report) = spawn_repl_server().await;
    let mut stream = connector(&url).open("/ws/interactive/s-2").await.unwrap();

    stream.send_text("bye\n").unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), stream.recv())
        .await
        .unwrap();
    assert_eq!(event, Some(StreamEvent::Closed));
}

#[tokio::test]
async fn local_close_releases_socket_without_close_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (eof_tx, eof_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        // raw reads: the close frame is never answered
        let raw = ws.get_mut();
        let mut buf = [0u8; 256];
        loop {
            match raw.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
        let _ = eof_tx.send(());
    });

    let mut stream = connector(&format!("http://{}", addr))
        .open("/ws/status/job-1")
        .await
        .unwrap();
    assert!(stream.close());

    tokio::time::timeout(Duration::from_secs(3), eof_rx)
        .await
        .expect("client socket still open after close")
        .unwrap();
}

#[tokio::test]
async fn connect_failure_is_stream_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = connector(&format!("http://{}", addr))
        .open("/ws/status/job-1")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Stream(_)));
}
