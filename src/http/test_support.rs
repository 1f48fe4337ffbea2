//! Minimal keep-alive HTTP/1.1 server used by executor and engine tests.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: Arc<str>,
    delay: Option<Duration>,
    /// Advertised length when it differs from the body; the connection is
    /// closed right after the short body.
    declared_len: Option<usize>,
}

pub(crate) struct TestServer {
    pub(crate) url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    pub(crate) async fn spawn(status: u16, body: &'static str) -> Result<Self, String> {
        Self::start(Reply {
            status,
            body: body.into(),
            delay: None,
            declared_len: None,
        })
        .await
    }

    /// Replies with a body of `len` bytes.
    pub(crate) async fn spawn_sized(status: u16, len: usize) -> Result<Self, String> {
        Self::start(Reply {
            status,
            body: "x".repeat(len).into(),
            delay: None,
            declared_len: None,
        })
        .await
    }

    /// Advertises `declared_len` bytes, sends only `body`, then hangs up.
    pub(crate) async fn spawn_truncated(
        status: u16,
        body: &'static str,
        declared_len: usize,
    ) -> Result<Self, String> {
        Self::start(Reply {
            status,
            body: body.into(),
            delay: None,
            declared_len: Some(declared_len),
        })
        .await
    }

    pub(crate) async fn spawn_with_delay(
        status: u16,
        body: &'static str,
        delay: Duration,
    ) -> Result<Self, String> {
        Self::start(Reply {
            status,
            body: body.into(),
            delay: Some(delay),
            declared_len: None,
        })
        .await
    }

    async fn start(reply: Reply) -> Result<Self, String> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("bind test server failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("server addr failed: {}", err))?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let accept_requests = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let requests = Arc::clone(&accept_requests);
                let reply = reply.clone();
                tokio::spawn(handle_connection(stream, reply, requests));
            }
        });

        Ok(Self {
            url: format!("http://{}/", addr),
            requests,
            handle,
        })
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// URL of a port nothing listens on.
pub(crate) async fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind probe failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

async fn handle_connection(
    stream: TcpStream,
    reply: Reply,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let method = request_line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_owned();

        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                break;
            }
            if let Some((name, value)) = trimmed.split_once(':') {
                let name = name.trim().to_owned();
                let value = value.trim().to_owned();
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap_or(0);
                }
                headers.push((name, value));
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method,
                headers,
                body,
            });

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }

        let reason = if reply.status == 200 { "OK" } else { "Status" };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\r\n{}",
            reply.status,
            reason,
            reply.declared_len.unwrap_or(reply.body.len()),
            reply.body
        );
        if write_half.write_all(response.as_bytes()).await.is_err()
            || reply.declared_len.is_some()
        {
            return;
        }
    }
}
