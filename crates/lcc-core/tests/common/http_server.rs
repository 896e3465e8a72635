//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves scripted responses keyed by request target (path plus query). Each
//! target replays its responses in order and keeps repeating the last one;
//! unknown targets get 404. Every request target is recorded.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.to_string(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

struct Route {
    replies: Vec<Reply>,
    served: usize,
}

#[derive(Default)]
struct Shared {
    routes: HashMap<String, Route>,
    requests: Vec<String>,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct TestServer {
    base: String,
    shared: Arc<Mutex<Shared>>,
}

impl TestServer {
    pub fn url(&self, target: &str) -> String {
        format!("{}{}", self.base, target)
    }

    /// Request targets received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.shared.lock().unwrap().requests.clone()
    }
}

/// Starts a server in a background thread serving `routes`.
pub fn start(routes: Vec<(&str, Vec<Reply>)>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let shared = Arc::new(Mutex::new(Shared {
        routes: routes
            .into_iter()
            .map(|(target, replies)| (target.to_string(), Route { replies, served: 0 }))
            .collect(),
        requests: Vec::new(),
    }));
    let server_shared = Arc::clone(&shared);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = Arc::clone(&server_shared);
            thread::spawn(move || handle(stream, &shared));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        shared,
    }
}

fn handle(mut stream: TcpStream, shared: &Mutex<Shared>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let reply = {
        let mut shared = shared.lock().unwrap();
        shared.requests.push(target.clone());
        match shared.routes.get_mut(&target) {
            Some(route) if !route.replies.is_empty() => {
                let idx = route.served.min(route.replies.len() - 1);
                route.served += 1;
                route.replies[idx].clone()
            }
            _ => Reply::json(404, serde_json::json!({"error": "not found"})),
        }
    };

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reason(reply.status),
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(reply.body.as_bytes());
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
