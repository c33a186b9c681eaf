#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Isolated config dir, temp dir and project tree for one test.
pub struct TestEnv {
    _tmp: TempDir,
    pub config_dir: PathBuf,
    pub scratch: PathBuf,
    pub project: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config_dir = tmp.path().join("config");
        let scratch = tmp.path().join("scratch");
        fs::create_dir_all(&scratch).expect("create scratch tmp");
        let project = make_fixture_project(tmp.path());
        Self {
            _tmp: tmp,
            config_dir,
            scratch,
            project,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("alice");
        cmd.env("ALICE_CONFIG_DIR", &self.config_dir)
            .env("TMPDIR", &self.scratch)
            .env("NO_COLOR", "1")
            .env("CI", "1");
        for var in CLEARED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Same environment as [`cmd`](Self::cmd), for tests that need to
    /// spawn the process and interact with it while it runs.
    pub fn spawnable(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_alice"));
        cmd.env("ALICE_CONFIG_DIR", &self.config_dir)
            .env("TMPDIR", &self.scratch)
            .env("NO_COLOR", "1")
            .env("CI", "1");
        for var in CLEARED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Write raw bytes as the config file.
    pub fn write_raw_config(&self, body: &str) {
        fs::create_dir_all(&self.config_dir).expect("create config dir");
        fs::write(self.config_dir.join("config.json"), body).expect("write config");
    }

    /// Write a config file pointing at `server_url`.
    pub fn configure(&self, api_key: &str, server_url: &str) {
        fs::create_dir_all(&self.config_dir).expect("create config dir");
        let body = serde_json::json!({
            "apiKey": api_key,
            "serverUrl": server_url,
            "developerName": "Test Dev",
            "developerEmail": "dev@example.com",
            "timeoutSecs": "30"
        });
        fs::write(self.config_dir.join("config.json"), body.to_string()).expect("write config");
    }

    pub fn stored_config(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.config_dir.join("config.json")).expect("read config");
        serde_json::from_str(&raw).expect("config is json")
    }

    /// Temporary archive directories still present under the scratch dir.
    pub fn leftover_archives(&self) -> Vec<PathBuf> {
        leftover_archives_in(&self.scratch)
    }
}

const CLEARED_VARS: &[&str] = &[
    "ALICE_API_KEY",
    "ALICE_SERVER_URL",
    "ALICE_DEVELOPER_NAME",
    "ALICE_DEVELOPER_EMAIL",
    "ALICE_TIMEOUT_SECS",
    "ALICE_LOG",
];

/// `alice-*` entries directly under `dir`.
pub fn leftover_archives_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .expect("read scratch")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("alice-"))
        })
        .collect()
}

fn make_fixture_project(base: &Path) -> PathBuf {
    let project = base.join("project");
    let write = |rel: &str, body: &str| {
        let p = project.join(rel);
        fs::create_dir_all(p.parent().expect("parent")).expect("create dirs");
        fs::write(p, body).expect("write fixture file");
    };
    write("package.json", "{\"name\":\"fixture\"}");
    write("src/index.js", "console.log('hi')\n");
    write(".env.example", "API_URL=\n");
    for i in 0..500 {
        write(&format!("node_modules/dep{}/file{i}.js", i % 10), "module.exports = 1\n");
    }
    project
}

/// A single-request HTTP responder on an ephemeral port.
pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<Option<String>>,
    received: Receiver<()>,
}

enum Reply {
    Send {
        status: u16,
        content_type: String,
        body: String,
    },
    /// Never answer; keep the connection open until the client hangs up.
    Hold,
}

impl StubServer {
    pub fn respond(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self::respond_within(status, content_type, body, Duration::from_secs(60))
    }

    /// Like [`respond`](Self::respond) but stops waiting for a client after `wait`.
    pub fn respond_within(
        status: u16,
        content_type: &str,
        body: impl Into<String>,
        wait: Duration,
    ) -> Self {
        Self::spawn(
            Reply::Send {
                status,
                content_type: content_type.to_string(),
                body: body.into(),
            },
            wait,
        )
    }

    /// Read the request and never answer it.
    pub fn hold() -> Self {
        Self::spawn(Reply::Hold, Duration::from_secs(60))
    }

    /// Block until the full request body has arrived.
    pub fn wait_for_request(&self, timeout: Duration) -> bool {
        self.received.recv_timeout(timeout).is_ok()
    }

    fn spawn(reply: Reply, wait: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let (tx, received) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            let deadline = Instant::now() + wait;
            let mut stream = loop {
                match listener.accept() {
                    Ok((stream, _)) => break stream,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        if Instant::now() >= deadline {
                            return None;
                        }
                        std::thread::sleep(Duration::from_millis(20));
                    }
                    Err(e) => panic!("accept failed: {e}"),
                }
            };
            stream.set_nonblocking(false).expect("blocking stream");
            stream
                .set_read_timeout(Some(Duration::from_secs(30)))
                .expect("read timeout");
            let request = read_request(&mut stream);
            let _ = tx.send(());
            match reply {
                Reply::Send {
                    status,
                    content_type,
                    body,
                } => {
                    let response = format!(
                        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        reason(status),
                        body.len()
                    );
                    stream.write_all(response.as_bytes()).expect("write response");
                    let _ = stream.flush();
                }
                Reply::Hold => {
                    let mut sink = [0u8; 64];
                    while matches!(stream.read(&mut sink), Ok(n) if n > 0) {}
                }
            }
            Some(request)
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
            received,
        }
    }

    /// The raw request the server saw, or `None` if nobody connected.
    pub fn finish(self) -> Option<String> {
        self.handle.join().expect("stub server thread")
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Status",
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = head.lines().find_map(|l| {
        l.strip_prefix("content-length:")
            .and_then(|v| v.trim().parse::<usize>().ok())
    });
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body = &buf[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if done {
            break;
        }
        let n = stream.read(&mut chunk).expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub fn analysis_json(status: &str, bugs: serde_json::Value) -> String {
    serde_json::json!({
        "status": "success",
        "analysis_id": "analysis-123",
        "quality_score": 72,
        "deployment_status": status,
        "total_files": 3,
        "issues": {"critical": 1, "high": 1, "medium": 0, "low": 2},
        "bugs": bugs,
        "analyzed_at": "2026-10-19T09:00:00"
    })
    .to_string()
}
