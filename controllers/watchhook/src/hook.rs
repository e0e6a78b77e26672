//! Hook command invocation.
//!
//! Each event runs the configured command once, with the event type label
//! appended to its arguments and the object rendered as YAML on its stdin.

use crate::error::ControllerError;
use cluster_client::{EventType, ObjectEvent, to_yaml};
use std::borrow::Cow;
use std::ffi::OsString;
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::debug;

/// Runs something for one event; the worker awaits each call before the next.
#[async_trait::async_trait]
pub trait Hook: Send + Sync {
    async fn invoke(&self, event: &ObjectEvent) -> Result<(), ControllerError>;
}

/// The command line given after `--`, kept byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandTemplate {
    /// Builds a template from a non-empty argv.
    pub fn from_argv(argv: Vec<OsString>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
        })
    }

    /// The concrete command line for one event.
    pub fn invocation(&self, event_type: EventType) -> CommandInvocation {
        let mut args = self.args.clone();
        args.push(OsString::from(event_type.label()));
        CommandInvocation {
            program: self.program.clone(),
            args,
        }
    }
}

/// Program and arguments for a single hook run; the last argument is the
/// event type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Program name for log lines and error text.
    pub fn display_program(&self) -> Cow<'_, str> {
        self.program.to_string_lossy()
    }

    fn failed(&self, reason: impl Into<String>) -> ControllerError {
        ControllerError::CommandInvocation {
            program: self.display_program().into_owned(),
            reason: reason.into(),
        }
    }
}

/// Hook that spawns an external process per event.
#[derive(Debug, Clone)]
pub struct CommandHook {
    template: CommandTemplate,
    timeout: Option<Duration>,
}

impl CommandHook {
    pub fn new(template: CommandTemplate, timeout: Option<Duration>) -> Self {
        Self { template, timeout }
    }
}

#[async_trait::async_trait]
impl Hook for CommandHook {
    async fn invoke(&self, event: &ObjectEvent) -> Result<(), ControllerError> {
        let input = to_yaml(&event.object)?;
        let invocation = self.template.invocation(event.event_type);

        debug!(
            "Calling {} {:?} for {}",
            invocation.display_program(),
            invocation.args,
            event.object_key()
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group: a terminal interrupt reaches watchhook only, and
        // the in-flight hook is left to finish
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| invocation.failed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| invocation.failed("failed to get stdin of command"))?;
        let writer = tokio::spawn(write_input(stdin, input));

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ControllerError::CommandTimeout {
                    program: invocation.display_program().into_owned(),
                    timeout,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| invocation.failed(e.to_string()))?;

        match writer.await? {
            Ok(()) => {}
            // The command exited without reading all of its input
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("{} did not read its input: {}", invocation.display_program(), e);
            }
            Err(e) => {
                return Err(
                    invocation.failed(format!("failed to write to stdin of command: {e}"))
                );
            }
        }

        if !output.status.success() {
            let reason = format!("{}{}", output.status, describe_output(&output));
            return Err(invocation.failed(reason));
        }

        debug!(
            "{} finished for {} {}",
            invocation.display_program(),
            event.event_type,
            event.object_key()
        );
        Ok(())
    }
}

/// Writes the payload and closes stdin; the handle is dropped on every path.
async fn write_input(mut stdin: ChildStdin, input: String) -> io::Result<()> {
    stdin.write_all(input.as_bytes()).await?;
    stdin.flush().await
}

/// Captured output as ` (<text>)`, or empty when there was none.
///
/// The pipes are read separately, so all of stdout comes before all of
/// stderr rather than in the order the command wrote them.
fn describe_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let text = text.trim_end_matches('\n');
    if text.is_empty() {
        String::new()
    } else {
        format!(" ({text})")
    }
}
