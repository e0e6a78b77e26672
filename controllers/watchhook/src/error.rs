//! Controller-specific error types.
//!
//! Every failure in the watch or dispatch path ends up here and is returned
//! to `main`, which reports it once and exits non-zero.

use cluster_client::{ClusterError, WatchError};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in watchhook.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Invalid command line
    #[error("{0}")]
    Configuration(String),

    /// Flags or positionals rejected by the argument parser
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// Signal listeners could not be installed
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    /// Connection, discovery, or watch setup failed
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// The server ended the watch
    #[error("watch closed")]
    WatchClosed,

    /// The watch stream reported an error
    #[error(transparent)]
    WatchStream(#[from] WatchError),

    /// The hook command could not be run or exited unsuccessfully
    #[error("failed calling command {program}: {reason}")]
    CommandInvocation { program: String, reason: String },

    /// The hook command exceeded `--hook-timeout`
    #[error("command {program} did not finish within {timeout:?}")]
    CommandTimeout { program: String, timeout: Duration },

    /// A pipeline task panicked or was cancelled
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
