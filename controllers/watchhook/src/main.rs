//! watchhook
//!
//! Watches a Kubernetes resource and runs a command for every change event.
//!
//! ```text
//! watchhook <kind>[.<version>][.<group>] [<name>] -- <command> [<command-arg>...]
//! ```
//!
//! The command receives the event object as YAML on stdin and the event type
//! (`ADDED`, `MODIFIED`, `DELETED`) as its last argument. Commands run one at
//! a time, in event order; the first failing command stops the watch.

mod args;
mod controller;
mod dispatcher;
mod error;
mod hook;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::args::WatchHookOptions;
use crate::controller::{Controller, Termination, shutdown_signal};
use crate::error::ControllerError;
use crate::hook::CommandHook;
use cluster_client::{ClusterClient, ResourceHandle, WatchTarget};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout is left alone
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match WatchHookOptions::parse_from(std::env::args_os()) {
        Ok(options) => run(options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(termination) => {
            info!("Shutting down ({:?})", termination);
            ExitCode::SUCCESS
        }
        // clap prints usage, help and version itself
        Err(ControllerError::Usage(e)) => e.exit(),
        Err(e) => {
            error!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(options: WatchHookOptions) -> Result<Termination, ControllerError> {
    // Listen before touching the cluster so an early interrupt exits cleanly
    let shutdown = shutdown_signal().map_err(ControllerError::Signal)?;
    tokio::pin!(shutdown);

    // Configure rustls crypto provider before the first TLS connection
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    let (handle, target) = tokio::select! {
        setup = connect(&options) => setup?,
        () = &mut shutdown => {
            info!("Interrupted before the watch started");
            return Ok(Termination::Interrupted);
        }
    };

    let hook = Arc::new(CommandHook::new(options.command, options.hook_timeout));
    Controller::new(handle, hook, target).run(shutdown).await
}

/// Connects, logs the effective configuration and resolves the resource.
async fn connect(
    options: &WatchHookOptions,
) -> Result<(ResourceHandle, WatchTarget), ControllerError> {
    let client = ClusterClient::connect(&options.connection).await?;
    let target = WatchTarget {
        resource_ref: options.resource_ref.clone(),
        namespace: client.namespace().to_string(),
        name: options.name.clone(),
    };

    info!("Configuration:");
    info!("  Resource: {}", target.resource_ref);
    info!("  Namespace: {}", target.namespace);
    info!("  Object: {}", target.name.as_deref().unwrap_or("all objects"));
    info!(
        "  Command: {} {:?}",
        options.command.program.to_string_lossy(),
        options.command.args
    );
    if let Some(timeout) = options.hook_timeout {
        info!("  Hook timeout: {:?}", timeout);
    }

    let handle = client.resolve(&target.resource_ref, &target.namespace).await?;
    if handle.is_cluster_scoped() {
        info!("{} is cluster-scoped, ignoring namespace", handle.resource().kind);
    }

    Ok((handle, target))
}
