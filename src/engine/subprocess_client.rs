//! Engine subprocess client - runs the engine executable with a JSON request

use crate::engine::{EngineClientConfig, EngineError, EngineRequest, ModelingEngine, PipelineResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs the modeling engine as a child process.
///
/// The request is written to the child's stdin as JSON and the
/// [`PipelineResult`] is read back as JSON from its stdout. The call blocks
/// until the engine exits; there is no timeout.
#[derive(Debug, Clone)]
pub struct SubprocessEngine {
    config: EngineClientConfig,
}

impl SubprocessEngine {
    pub fn new(config: EngineClientConfig) -> Self {
        Self { config }
    }

    pub fn program(&self) -> &str {
        self.config.program()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.config.program());
        command.args(&self.config.args).kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ModelingEngine for SubprocessEngine {
    /// Run `<program> --check` once to confirm the engine is usable.
    ///
    /// # Errors
    /// Returns `EngineError::Spawn` if the executable cannot be started and
    /// `EngineError::Initialization` if the check exits unsuccessfully.
    async fn initialize(&self) -> Result<(), EngineError> {
        debug!("Checking engine executable '{}'", self.program());

        let output = self
            .command()
            .arg("--check")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Spawn {
                program: self.program().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Initialization(format!(
                "'{}' failed its self-check: {}",
                self.program(),
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Run the engine once for `request`.
    ///
    /// The request is streamed to stdin while stdout and stderr are drained,
    /// so neither side can stall on a full pipe.
    ///
    /// # Arguments
    /// * `request` - Resolved configuration, samples and diet for this run
    ///
    /// # Returns
    /// The engine's [`PipelineResult`], decoded from stdout
    ///
    /// # Errors
    /// Returns `EngineError` if:
    /// - The engine executable cannot be spawned
    /// - The engine exits with a non-zero status (also when it stopped
    ///   reading the request early)
    /// - The request cannot be written for a reason other than a closed pipe
    /// - stdout is not a valid `PipelineResult` JSON document
    async fn run(&self, request: &EngineRequest<'_>) -> Result<PipelineResult, EngineError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| EngineError::Internal(format!("Failed to encode request: {}", e)))?;
        debug!(
            "Spawning engine '{}' with {} byte request",
            self.program(),
            payload.len()
        );

        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::Spawn {
                program: self.program().to_string(),
                reason: e.to_string(),
            })?;

        let stdin = child.stdin.take();
        let send = async move {
            match stdin {
                // Dropping stdin afterwards closes the pipe so the engine sees EOF
                Some(mut stdin) => stdin.write_all(&payload).await,
                None => Ok(()),
            }
        };
        let (sent, output) = tokio::join!(send, child.wait_with_output());
        let output = output
            .map_err(|e| EngineError::Internal(format!("Failed to wait for engine: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            warn!("Engine exited with code {}: {}", code, stderr.trim());
            return Err(EngineError::Exit {
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        match sent {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("Engine closed stdin before reading the whole request");
            }
            Err(e) => {
                return Err(EngineError::Internal(format!("Failed to send request: {}", e)));
            }
            Ok(()) => {}
        }

        debug!("Engine returned {} bytes of output", output.stdout.len());
        serde_json::from_slice(&output.stdout).map_err(|e| EngineError::Decode(e.to_string()))
    }
}
