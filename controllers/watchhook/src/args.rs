//! Command-line parsing.
//!
//! The raw argument vector is split at the first `--` before clap sees it:
//! everything after the marker is the hook command line and is never
//! interpreted as flags.

use crate::error::ControllerError;
use crate::hook::CommandTemplate;
use clap::Parser;
use cluster_client::{ConnectionOptions, ResourceRef};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

const COMMAND_MARKER: &str = "--";

/// Watch objects and call command on events
#[derive(Debug, Parser)]
#[command(
    name = "watchhook",
    version,
    override_usage = "watchhook [OPTIONS] <RESOURCE> [NAME] -- <COMMAND> [COMMAND_ARG]...",
    after_help = "The event type (ADDED, MODIFIED or DELETED) is appended to the command's \
                  arguments and the object is written to its stdin as YAML.\n\n\
                  Example:\n  watchhook pod my-pod -- sh my-cmd.sh"
)]
struct Cli {
    /// Resource to watch: kind[.version][.group]
    resource: String,

    /// Only watch the object with this name; exit once it is deleted
    name: Option<String>,

    /// Namespace to watch (defaults to the kubeconfig context's namespace)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// Kubeconfig cluster to use
    #[arg(long)]
    cluster: Option<String>,

    /// Kubeconfig user to use
    #[arg(long)]
    user: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Kill a hook command that runs longer than this and fail
    #[arg(long, value_name = "SECONDS")]
    hook_timeout: Option<u64>,
}

/// Fully validated run configuration.
#[derive(Debug, Clone)]
pub struct WatchHookOptions {
    pub resource_ref: ResourceRef,
    pub name: Option<String>,
    pub command: CommandTemplate,
    pub connection: ConnectionOptions,
    pub hook_timeout: Option<Duration>,
}

impl WatchHookOptions {
    /// Parses a full argument vector, including the program name.
    pub fn parse_from<I, T>(args: I) -> Result<Self, ControllerError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = args.into_iter().map(Into::into).collect();
        let (tool_args, command_args) = split_command_line(args);

        let cli = Cli::try_parse_from(tool_args)?;

        let command_args = command_args.ok_or_else(|| {
            ControllerError::Configuration(format!("{COMMAND_MARKER} arg is required"))
        })?;
        let command = CommandTemplate::from_argv(command_args)
            .ok_or_else(|| ControllerError::Configuration("<command> is required".to_string()))?;

        Ok(Self {
            resource_ref: ResourceRef::parse(&cli.resource),
            name: cli.name,
            command,
            connection: ConnectionOptions {
                kubeconfig: cli.kubeconfig,
                context: cli.context,
                cluster: cli.cluster,
                user: cli.user,
                namespace: cli.namespace,
            },
            hook_timeout: cli.hook_timeout.map(Duration::from_secs),
        })
    }
}

/// Splits the argument vector at the first `--`.
///
/// Returns the tool's own arguments and, when the marker is present, the
/// command line that follows it (possibly empty).
pub fn split_command_line(args: Vec<OsString>) -> (Vec<OsString>, Option<Vec<OsString>>) {
    match args.iter().position(|arg| arg == COMMAND_MARKER) {
        Some(idx) => {
            let mut tool_args = args;
            let command = tool_args.split_off(idx + 1);
            tool_args.pop();
            (tool_args, Some(command))
        }
        None => (args, None),
    }
}
