//! Cluster client for watchhook
//!
//! Resolves compact resource identifiers against a Kubernetes cluster and
//! opens watch streams on them.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClient, ConnectionOptions, ResourceRef, ResourceWatcher};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClusterClient::connect(&ConnectionOptions::default()).await?;
//! let resource_ref = ResourceRef::parse("deployment.apps");
//! let handle = client.resolve(&resource_ref, client.namespace()).await?;
//!
//! let mut events = handle.watch(None).await?;
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     println!("{} {}", event.event_type, event.object_key());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod render;
pub mod resource_ref;
pub mod watch;
#[path = "trait.rs"]
pub mod watcher_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{ClusterClient, ConnectionOptions, ResourceHandle};
pub use error::{ClusterError, WatchError};
pub use render::to_yaml;
pub use resource_ref::ResourceRef;
pub use watch::{EventStream, EventType, ObjectEvent, WatchTarget};
pub use watcher_trait::ResourceWatcher;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockEventSender, MockResourceWatcher};
