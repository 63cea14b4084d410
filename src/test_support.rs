// src/test_support.rs
//! Canned HTTP responders on a local socket for exercising the HTTP clients.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request_line: String,
    pub headers: String,
    pub body: String,
}

pub type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

/// Answers one connection per entry in `responses`, in order, and records
/// every request it saw. Returns the server's base URL.
pub async fn serve_sequence(responses: Vec<(&'static str, String)>) -> (String, RequestLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let recorded = log.clone();

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            recorded.lock().unwrap().push(request);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), log)
}

pub async fn serve_once(status: &'static str, body: &str) -> (String, RequestLog) {
    serve_sequence(vec![(status, body.to_string())]).await
}

async fn read_request(socket: &mut TcpStream) -> RecordedRequest {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break Some(pos);
        }
    };

    let Some(header_end) = header_end else {
        return RecordedRequest {
            request_line: String::new(),
            headers: String::new(),
            body: String::new(),
        };
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while data.len() < body_start + content_length {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    let (request_line, headers) = head.split_once("\r\n").unwrap_or((head.as_str(), ""));
    RecordedRequest {
        request_line: request_line.to_string(),
        headers: headers.to_string(),
        body: String::from_utf8_lossy(&data[body_start.min(data.len())..]).to_string(),
    }
}
