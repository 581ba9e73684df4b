//! Playwright browser automation
//!
//! Each [`PlaywrightSession`] is a `node` child process running the embedded
//! bridge script, which owns one browser context. Requests and replies are
//! newline-delimited JSON over the child's stdin/stdout, one request in flight
//! at a time.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::engine::{BoundingBox, ElementHandle, Engine, Page};
use crate::error::{HarnessError, HarnessResult};
use crate::selector::Selector;

/// Bridge script run by `node` for every session
pub const BRIDGE_SCRIPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/bridge.js"));

/// Extra time allowed on top of a request's own timeout for the reply to arrive
const REPLY_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(HarnessError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node.js executable
    pub node_binary: PathBuf,

    /// Extra module search path for resolving the `playwright` package
    pub node_path: Option<PathBuf>,

    /// How long a browser may take to start
    pub launch_timeout_ms: u64,

    /// Ceiling for requests that carry no timeout of their own
    pub request_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            node_path: None,
            launch_timeout_ms: 30_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Hands out one bridge process per scenario
#[derive(Debug, Clone)]
pub struct PlaywrightEngine {
    config: PlaywrightConfig,
}

impl PlaywrightEngine {
    pub fn new(config: PlaywrightConfig) -> HarnessResult<Self> {
        Self::check_node_installed(&config)?;
        Ok(Self { config })
    }

    fn check_node_installed(config: &PlaywrightConfig) -> HarnessResult<()> {
        let status = Command::new(&config.node_binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::Engine(format!(
                "{} not found. Install Node.js and run: npm install playwright && npx playwright install",
                config.node_binary.display()
            ))),
        }
    }
}

#[async_trait]
impl Engine for PlaywrightEngine {
    async fn open(&self) -> HarnessResult<Box<dyn Page>> {
        let session = PlaywrightSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeRequest<'a> {
    Goto { url: &'a str, timeout_ms: u64 },
    WaitForLoadState { state: &'a str, timeout_ms: u64 },
    Count { selector: &'a str },
    BoundingBox { selector: &'a str, index: usize },
    Attribute { selector: &'a str, index: usize, name: &'a str },
    Content,
    Evaluate { expression: &'a str },
    Title,
    Url,
    Close,
}

impl BridgeRequest<'_> {
    fn op(&self) -> &'static str {
        match self {
            BridgeRequest::Goto { .. } => "goto",
            BridgeRequest::WaitForLoadState { .. } => "wait_for_load_state",
            BridgeRequest::Count { .. } => "count",
            BridgeRequest::BoundingBox { .. } => "bounding_box",
            BridgeRequest::Attribute { .. } => "attribute",
            BridgeRequest::Content => "content",
            BridgeRequest::Evaluate { .. } => "evaluate",
            BridgeRequest::Title => "title",
            BridgeRequest::Url => "url",
            BridgeRequest::Close => "close",
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    request: &'a BridgeRequest<'a>,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

impl BridgeReply {
    fn into_result(self, op: &str) -> HarnessResult<Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = format!("{}: {}", op, self.error.unwrap_or_else(|| "unknown error".to_string()));
        if self.timeout {
            Err(HarnessError::EngineTimeout(message))
        } else {
            Err(HarnessError::Engine(message))
        }
    }
}

/// One browser context behind a bridge process
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    request_timeout: Duration,
    closed: bool,

    // Holds the bridge script until the process exits
    _script_dir: TempDir,
}

impl PlaywrightSession {
    pub async fn launch(config: &PlaywrightConfig) -> HarnessResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("sitecheck-bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let mut cmd = TokioCommand::new(&config.node_binary);
        cmd.arg(&script_path)
            .env("SITECHECK_BROWSER", config.browser.as_str())
            .env("SITECHECK_HEADLESS", if config.headless { "1" } else { "0" })
            .env(
                "SITECHECK_VIEWPORT",
                format!("{}x{}", config.viewport_width, config.viewport_height),
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(node_path) = &config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let mut child = cmd.spawn().map_err(|e| {
            HarnessError::Engine(format!("Failed to spawn {}: {}", config.node_binary.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::Engine("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::Engine("bridge stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge] {}", line);
                }
            });
        }

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            closed: false,
            _script_dir: script_dir,
        };

        let launch_timeout = Duration::from_millis(config.launch_timeout_ms);
        match tokio::time::timeout(launch_timeout, session.read_reply(0)).await {
            Ok(Ok(reply)) => {
                reply.into_result("launch")?;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(HarnessError::EngineTimeout(format!(
                    "{} did not start within {} ms",
                    config.browser.as_str(),
                    config.launch_timeout_ms
                )))
            }
        }

        info!(
            "Launched {} (pid {:?}, headless: {})",
            config.browser.as_str(),
            session.child.id(),
            config.headless
        );
        Ok(session)
    }

    /// Read lines until the reply for `id` arrives. Lines that are not replies
    /// (stray console output) and replies to abandoned requests are skipped.
    async fn read_reply(&mut self, id: u64) -> HarnessResult<BridgeReply> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| HarnessError::Engine("bridge process exited".to_string()))?;

            match serde_json::from_str::<BridgeReply>(&line) {
                Ok(reply) if reply.id == id => return Ok(reply),
                Ok(reply) => debug!("Skipping stale bridge reply {}", reply.id),
                Err(_) => debug!("[bridge stdout] {}", line),
            }
        }
    }

    async fn request(&mut self, request: BridgeRequest<'_>, timeout: Duration) -> HarnessResult<Value> {
        let op = request.op();
        if self.closed {
            return Err(HarnessError::Engine(format!("{}: session already closed", op)));
        }

        self.next_id += 1;
        let id = self.next_id;
        let mut line = serde_json::to_string(&Envelope { id, request: &request })?;
        line.push('\n');

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = tokio::time::timeout(timeout + REPLY_GRACE, self.read_reply(id))
            .await
            .map_err(|_| HarnessError::EngineTimeout(format!("{}: no reply from bridge", op)))??;

        reply.into_result(op)
    }

    async fn simple(&mut self, request: BridgeRequest<'_>) -> HarnessResult<Value> {
        let timeout = self.request_timeout;
        self.request(request, timeout).await
    }
}

fn expect_string(op: &str, value: Value) -> HarnessResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(HarnessError::Engine(format!("{}: expected a string, got {}", op, other))),
    }
}

#[async_trait]
impl Page for PlaywrightSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> HarnessResult<()> {
        let timeout_ms = timeout.as_millis() as u64;
        let status = self.request(BridgeRequest::Goto { url, timeout_ms }, timeout).await?;
        if let Some(status) = status.as_u64() {
            debug!("GET {} -> {}", url, status);
            if status >= 400 {
                warn!("{} answered HTTP {}", url, status);
            }
        }
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> HarnessResult<()> {
        let timeout_ms = timeout.as_millis() as u64;
        self.request(
            BridgeRequest::WaitForLoadState { state: "networkidle", timeout_ms },
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn query(&mut self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        let css = selector.to_css();
        let count = self.simple(BridgeRequest::Count { selector: &css }).await?;
        let count = count
            .as_u64()
            .ok_or_else(|| HarnessError::Engine(format!("count: expected a number, got {}", count)))?;
        Ok(ElementHandle::for_matches(selector, count as usize))
    }

    async fn bounding_box(&mut self, handle: &ElementHandle) -> HarnessResult<Option<BoundingBox>> {
        let value = self
            .simple(BridgeRequest::BoundingBox {
                selector: handle.css(),
                index: handle.index(),
            })
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn attribute(&mut self, handle: &ElementHandle, name: &str) -> HarnessResult<Option<String>> {
        let value = self
            .simple(BridgeRequest::Attribute {
                selector: handle.css(),
                index: handle.index(),
                name,
            })
            .await?;
        match value {
            Value::Null => Ok(None),
            other => expect_string("attribute", other).map(Some),
        }
    }

    async fn content(&mut self) -> HarnessResult<String> {
        let value = self.simple(BridgeRequest::Content).await?;
        expect_string("content", value)
    }

    async fn evaluate(&mut self, expression: &str) -> HarnessResult<Value> {
        self.simple(BridgeRequest::Evaluate { expression }).await
    }

    async fn title(&mut self) -> HarnessResult<String> {
        let value = self.simple(BridgeRequest::Title).await?;
        expect_string("title", value)
    }

    async fn url(&mut self) -> HarnessResult<String> {
        let value = self.simple(BridgeRequest::Url).await?;
        expect_string("url", value)
    }

    async fn close(&mut self) -> HarnessResult<()> {
        if self.closed {
            return Ok(());
        }

        if let Err(e) = self.request(BridgeRequest::Close, Duration::from_secs(5)).await {
            warn!("Bridge did not close cleanly: {}", e);
        }
        self.closed = true;

        // Force kill if still running
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
        Ok(())
    }
}
