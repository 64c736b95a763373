#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::Command;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tempfile::TempDir;
use wiremock::{Mock, MockServer, Request};

/// A wiremock server driven from synchronous tests.
///
/// wiremock serves requests from its own thread, so the runtime is only
/// needed to start the server and register mocks. The blocking client must
/// not run inside `block_on`.
pub struct MockApi {
    pub server: MockServer,
    rt: tokio::runtime::Runtime,
}

impl MockApi {
    pub fn start() -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime");
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs() as i64
}

/// Unsigned compact JWT carrying `payload` as its claims.
pub fn jwt(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, body)
}

pub fn valid_token() -> String {
    jwt(serde_json::json!({ "sub": "user-1", "exp": now() + 3600 }))
}

pub fn expired_token() -> String {
    jwt(serde_json::json!({ "sub": "user-1", "exp": now() - 60 }))
}

/// A port nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Isolated configuration file plus a command that points at it.
pub struct TestEnv {
    _tmp: TempDir,
    pub config: PathBuf,
}

impl TestEnv {
    pub fn new(base_url: &str, token: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config = tmp.path().join("config.yaml");
        fs::write(
            &config,
            format!("base_url: {}\njwt_token: '{}'\ndebug: false\n", base_url, token),
        )
        .expect("write config");
        Self { _tmp: tmp, config }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("flight-cu").expect("binary built");
        cmd.arg("--config")
            .arg(&self.config)
            .env_remove("FLIGHT_CU_CONFIG")
            .env_remove("FLIGHT_CU_LOG");
        cmd
    }

    pub fn config_text(&self) -> String {
        fs::read_to_string(&self.config).expect("read config")
    }
}

/// Mark `path` read-only. Returns false when the current user can still
/// open it for writing, in which case a failed write cannot be staged.
pub fn make_read_only(path: &Path) -> bool {
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms).expect("set permissions");
    fs::OpenOptions::new().write(true).open(path).is_err()
}
