use std::process::ExitStatus;
use std::time::Duration;

use serde::Serialize;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::WatchError;

/// How the monitored command ended
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProcessResult {
    /// Exit code for the overall invocation: the child's own code, or
    /// 128+signo when it died by signal (shell convention).
    pub exit_code: i32,
    pub signaled: bool,
    pub signal: Option<i32>,
    pub wall: Duration,
}

impl ProcessResult {
    pub fn from_status(status: ExitStatus, wall: Duration) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self {
                    exit_code: 128 + signal,
                    signaled: true,
                    signal: Some(signal),
                    wall,
                };
            }
        }

        Self {
            exit_code: status.code().unwrap_or(1),
            signaled: false,
            signal: None,
            wall,
        }
    }
}

/// Spawn the target command with inherited stdio, so the user sees the
/// child's own output live.
pub fn spawn_child(command: &str, args: &[String]) -> Result<Child, WatchError> {
    debug!("spawning monitored command: {} {:?}", command, args);

    Command::new(command)
        .args(args)
        .spawn()
        .map_err(|source| WatchError::Launch {
            command: command.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_exit_code_is_captured() {
        let started = Instant::now();
        let mut child = spawn_child("sh", &["-c".into(), "exit 7".into()]).unwrap();
        let status = child.wait().await.unwrap();
        let result = ProcessResult::from_status(status, started.elapsed());

        assert_eq!(result.exit_code, 7);
        assert!(!result.signaled);
        assert!(result.signal.is_none());
    }

    #[tokio::test]
    async fn test_signal_termination_maps_to_convention() {
        let started = Instant::now();
        let mut child = spawn_child("sh", &["-c".into(), "kill -TERM $$".into()]).unwrap();
        let status = child.wait().await.unwrap();
        let result = ProcessResult::from_status(status, started.elapsed());

        assert!(result.signaled);
        assert_eq!(result.signal, Some(15));
        assert_eq!(result.exit_code, 143);
    }

    #[tokio::test]
    async fn test_missing_executable_is_a_launch_error() {
        let err = spawn_child("definitely-not-a-real-binary", &[]).unwrap_err();
        match err {
            WatchError::Launch { command, .. } => {
                assert_eq!(command, "definitely-not-a-real-binary");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
