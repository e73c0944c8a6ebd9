//! Browser executor - wraps agent-browser CLI
//!
//! Provides async interface to agent-browser commands.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::browser::driver::{PageDriver, OUTER_HTML_SCRIPT};
use crate::core::config::BrowserConfig;
use crate::core::{GondolaError, Result};

/// Executor for browser automation via agent-browser CLI
pub struct BrowserExecutor {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Per-command timeout
    timeout: Duration,
}

impl BrowserExecutor {
    /// Create a new browser executor
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            headed: false,
            timeout: Duration::from_secs(60),
        }
    }

    /// Create an executor from browser settings
    pub fn from_config(config: &BrowserConfig) -> Self {
        let mut executor = Self::new(config.session_name.clone());
        executor.set_headed(config.headed);
        executor.timeout = Duration::from_millis(config.timeout_ms);
        executor
    }

    /// Set headed mode
    pub fn set_headed(&mut self, headed: bool) {
        self.headed = headed;
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new("agent-browser")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Arguments shared by every invocation
    fn base_args(&self) -> Vec<String> {
        let mut args = vec!["--session".to_string(), self.session_name.clone()];
        if self.headed {
            args.push("--headed".to_string());
        }
        args
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("agent-browser");
        cmd.args(self.base_args());
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let action = args.first().copied().unwrap_or_default();
        debug!(action, "agent-browser");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| GondolaError::Timeout {
                action: action.to_string(),
                millis: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GondolaError::AgentBrowserNotFound
                } else {
                    GondolaError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(GondolaError::browser(format!(
                "agent-browser {} failed: {}",
                action,
                stderr.trim()
            )))
        }
    }

    /// Run a command and return JSON output
    async fn run_json_command(&self, args: &[&str]) -> Result<String> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");
        self.run_command(&full_args).await
    }
}

#[async_trait]
impl PageDriver for BrowserExecutor {
    async fn goto(&self, url: &str) -> Result<()> {
        self.run_command(&["open", url]).await?;

        if let Err(e) = self.run_command(&["wait", "--load", "networkidle"]).await {
            warn!(url, error = %e, "network did not go idle");
        }

        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.eval(OUTER_HTML_SCRIPT).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.run_command(&["click", selector]).await.map(|_| ())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.run_command(&["type", selector, text]).await.map(|_| ())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.run_command(&["fill", selector, text]).await.map(|_| ())
    }

    async fn eval(&self, script: &str) -> Result<String> {
        let output = self.run_json_command(&["eval", script]).await?;
        Ok(extract_eval_result(&output))
    }

    async fn close(&self) -> Result<()> {
        self.run_command(&["close"]).await.map(|_| ())
    }
}

impl Default for BrowserExecutor {
    fn default() -> Self {
        Self::new("gondola")
    }
}

/// Pull the evaluated value out of agent-browser's JSON output
///
/// Accepts the `{"success": .., "data": {"result": ..}}` envelope, a bare JSON
/// value, or plain text.
pub fn extract_eval_result(output: &str) -> String {
    let trimmed = output.trim();
    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return trimmed.to_string(),
    };

    let result = value
        .get("data")
        .map(|data| data.get("result").unwrap_or(data))
        .or_else(|| value.get("result"))
        .unwrap_or(&value);

    match result {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
