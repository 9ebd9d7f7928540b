use std::{
    ffi::OsStr,
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};
use tokio::process::{Child, Command};

use crate::future::WithTimeout;

struct MetricsGuard {
    start: Instant,
    armed: bool,
    command: String,
}

impl MetricsGuard {
    fn guard(command: String) -> Self {
        metrics::counter!(crate::init_metrics::PROCESS_START, "command" => command.clone())
            .increment(1);

        Self {
            start: Instant::now(),
            armed: true,
            command,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for MetricsGuard {
    fn drop(&mut self) {
        metrics::histogram!(
            crate::init_metrics::PROCESS_DURATION,
            "command" => self.command.clone(),
            "completed" => (!self.armed).to_string(),
        )
        .record(self.start.elapsed().as_secs_f64());

        metrics::counter!(
            crate::init_metrics::PROCESS_END,
            "completed" => (!self.armed).to_string(),
            "command" => self.command.clone(),
        )
        .increment(1);
    }
}

pub(crate) struct Process {
    command: String,
    child: Child,
    guard: MetricsGuard,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("command", &self.command)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProcessError {
    #[error("Required command {0} not found, make sure it exists in vidkeep's $PATH")]
    NotFound(String),

    #[error("Cannot run command {0} due to invalid permissions on binary, make sure the vidkeep user has permission to run it")]
    PermissionDenied(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("{command} failed with {status}")]
    Status {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Unknown process error")]
    Other(#[source] std::io::Error),
}

impl ProcessError {
    /// Anything the command wrote to stderr before exiting unsuccessfully
    pub(crate) fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Status { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

impl Process {
    pub(crate) fn run<T>(command: &str, args: &[T], timeout: Option<u64>) -> Result<Self, ProcessError>
    where
        T: AsRef<OsStr>,
    {
        let res = tracing::trace_span!(parent: None, "Create command", %command).in_scope(|| {
            Self::spawn(command, Command::new(command).args(args), timeout)
        });

        match res {
            Ok(this) => Ok(this),
            Err(e) => match e.kind() {
                std::io::ErrorKind::NotFound => Err(ProcessError::NotFound(command.to_string())),
                std::io::ErrorKind::PermissionDenied => {
                    Err(ProcessError::PermissionDenied(command.to_string()))
                }
                _ => Err(ProcessError::Other(e)),
            },
        }
    }

    fn spawn(command: &str, cmd: &mut Command, timeout: Option<u64>) -> std::io::Result<Self> {
        tracing::trace_span!(parent: None, "Spawn command", %command).in_scope(|| {
            let guard = MetricsGuard::guard(command.into());

            let cmd = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            cmd.spawn().map(|child| Process {
                child,
                command: String::from(command),
                guard,
                timeout: timeout.map(Duration::from_secs),
            })
        })
    }

    /// Wait for the command to exit, returning everything it wrote to stdout
    ///
    /// Without a timeout this waits for as long as the command runs. With one, the child is
    /// killed when the timeout elapses.
    #[tracing::instrument(skip(self), fields(command = %self.command))]
    pub(crate) async fn output(self) -> Result<Vec<u8>, ProcessError> {
        let Process {
            command,
            child,
            guard,
            timeout,
        } = self;

        let res = match timeout {
            Some(timeout) => match child.wait_with_output().with_timeout(timeout).await {
                Ok(res) => res,
                Err(_) => return Err(ProcessError::Timeout(command)),
            },
            None => child.wait_with_output().await,
        };

        match res {
            Ok(output) if output.status.success() => {
                guard.disarm();

                Ok(output.stdout)
            }
            Ok(output) => Err(ProcessError::Status {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            Err(e) => Err(ProcessError::Other(e)),
        }
    }
}
