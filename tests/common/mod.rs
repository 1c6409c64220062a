#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn unique_temp_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "chatbot-{suffix}-{stamp}-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}

/// Base URL nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    drop(listener);
    format!("http://{addr}/v1")
}

/// Runs the binary from `work_dir` so no stray `.env` is picked up, with
/// the given environment and piped stdin.
pub fn run_chatbot(work_dir: &Path, envs: &[(&str, &str)], stdin: &str) -> Output {
    run_chatbot_with_bytes(work_dir, envs, stdin.as_bytes())
}

pub fn run_chatbot_with_bytes(work_dir: &Path, envs: &[(&str, &str)], stdin: &[u8]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chatbot"));
    cmd.current_dir(work_dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("RUST_LOG")
        .env_remove("LOG_OUTPUT")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_FILE_PATH")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().expect("failed to spawn chatbot binary");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("failed to write stdin");
    child
        .wait_with_output()
        .expect("failed to wait for chatbot binary")
}

pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<Vec<CapturedRequest>>,
}

impl StubServer {
    /// Serves one canned `(status, body)` response per connection, in order.
    pub fn spawn(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|(status, body)| {
                    let (mut stream, _) = listener.accept().expect("accept should succeed");
                    let request = read_request(&mut stream);
                    write_response(&mut stream, status, body);
                    request
                })
                .collect()
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            handle,
        }
    }

    pub fn requests(self) -> Vec<CapturedRequest> {
        self.handle.join().expect("stub server thread should join")
    }
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
        let read = stream.read(&mut chunk).expect("read should succeed");
        assert!(read > 0, "client closed connection before sending headers");
        buf.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let read = stream.read(&mut chunk).expect("read should succeed");
        assert!(read > 0, "client closed connection before sending body");
        buf.extend_from_slice(&chunk[..read]);
    }

    CapturedRequest {
        head,
        body: String::from_utf8_lossy(&buf[head_end..head_end + content_length]).to_string(),
    }
}

fn write_response(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .expect("write should succeed");
    stream.flush().expect("flush should succeed");
}
