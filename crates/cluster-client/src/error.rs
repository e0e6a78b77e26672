//! Cluster client errors

use thiserror::Error;

/// Errors that can occur while connecting to the cluster and opening a watch
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Kubeconfig could not be read or does not describe a usable cluster
    #[error("failed to load cluster configuration: {0}")]
    Config(String),

    /// Client construction from the loaded configuration failed
    #[error("failed to create client: {0}")]
    Connection(#[source] kube::Error),

    /// API discovery request failed
    #[error("failed to discover API resources: {0}")]
    Discovery(#[source] kube::Error),

    /// The resource identifier does not map to a resource known to the cluster
    #[error("failed to get rest mapping: {0}")]
    Mapping(String),

    /// The watch request itself was rejected or could not be sent
    #[error("failed to establish watch: {0}")]
    WatchEstablish(#[source] kube::Error),

    /// An object could not be rendered for hook input
    #[error("failed to render object: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// Terminal conditions reported by the watch stream itself
#[derive(Debug, Error)]
pub enum WatchError {
    /// The server sent an `ERROR` watch event
    #[error("error event received: {0}")]
    ErrorEvent(String),

    /// The underlying connection failed mid-stream
    #[error("watch stream failed: {0}")]
    Stream(#[source] kube::Error),
}
