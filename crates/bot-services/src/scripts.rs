//! Helper script runner.
//!
//! Most data commands (league tables, fixtures, economic indicators, fuel
//! prices) are produced by standalone Python scripts that print the finished
//! reply on stdout. The runner executes one script per request with a bounded
//! wait and kills it if the deadline passes.

use crate::error::ServiceError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

/// Runs helper scripts from a fixed directory.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    interpreter_args: Vec<String>,
    scripts_dir: PathBuf,
    timeout: Duration,
}

impl ScriptRunner {
    /// Create a runner that invokes `<interpreter> -u <scripts_dir>/<script> args...`.
    pub fn new(
        interpreter: impl Into<String>,
        scripts_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            interpreter_args: vec!["-u".into()],
            scripts_dir: scripts_dir.into(),
            timeout,
        }
    }

    /// Replace the flags passed to the interpreter before the script path.
    pub fn with_interpreter_args(mut self, args: Vec<String>) -> Self {
        self.interpreter_args = args;
        self
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    /// Run a script and return its trimmed stdout.
    #[instrument(skip(self))]
    pub async fn run(&self, script: &str, args: &[String]) -> Result<String, ServiceError> {
        let script_path = self.scripts_dir.join(script);
        debug!(path = %script_path.display(), "Running script");

        let child = Command::new(&self.interpreter)
            .args(&self.interpreter_args)
            .arg(&script_path)
            .args(args)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                error!(script = %script, "Script timed out");
                return Err(ServiceError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(script = %script, status = %output.status, "Script failed: {}", stderr);
            return Err(ServiceError::Script {
                script: script.to_string(),
                message: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Deserialize)]
struct ScriptErrorReport {
    error: Option<String>,
}

/// Extract the message from a `{"error": "..."}` report printed by a script.
///
/// Scripts signal soft failures (an upstream site timing out, for instance)
/// this way while still exiting with status 0.
pub fn script_error(output: &str) -> Option<String> {
    let trimmed = output.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ScriptErrorReport>(trimmed)
        .ok()
        .and_then(|report| report.error)
}
