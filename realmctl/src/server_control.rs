//! Game server process control.

use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument, warn};

use crate::config::ServerControlConfig;
use crate::errors::{Error, Result};

/// Captured result of a control command. A non-zero exit is reported here, not as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ServerControl {
    config: ServerControlConfig,
}

impl ServerControl {
    pub fn new(config: ServerControlConfig) -> Self {
        Self { config }
    }

    /// Run the configured restart command and wait for it to exit.
    ///
    /// The command is executed directly, never through a shell.
    #[instrument(skip(self), fields(command = ?self.config.restart_command), err)]
    pub async fn restart(&self) -> Result<CommandOutput> {
        let (program, args) = self.config.restart_command.split_first().ok_or_else(|| Error::Configuration {
            message: "server.restart_command is empty".to_string(),
        })?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Io {
                path: PathBuf::from(program),
                source,
            })?;

        let result = CommandOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success {
            info!("Game server restart command succeeded");
        } else {
            warn!(status = ?result.status, "Game server restart command exited with failure");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(command: &[&str]) -> ServerControl {
        ServerControl::new(ServerControlConfig {
            restart_command: command.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_captures_output() {
        let output = control(&["sh", "-c", "echo restarted; echo warming up >&2"]).restart().await.unwrap();
        assert!(output.success);
        assert_eq!(output.status, Some(0));
        assert_eq!(output.stdout, "restarted\n");
        assert_eq!(output.stderr, "warming up\n");
    }

    #[test_log::test(tokio::test)]
    async fn test_failure_exit_is_not_an_error() {
        let output = control(&["sh", "-c", "exit 3"]).restart().await.unwrap();
        assert!(!output.success);
        assert_eq!(output.status, Some(3));
    }

    #[test_log::test(tokio::test)]
    async fn test_arguments_are_not_shell_expanded() {
        let output = control(&["echo", "$HOME", "; rm -rf /"]).restart().await.unwrap();
        assert_eq!(output.stdout, "$HOME ; rm -rf /\n");
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_program_is_io_error() {
        let err = control(&["/nonexistent/realm-restart"]).restart().await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_empty_command_is_configuration_error() {
        let err = control(&[]).restart().await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
