//! ResourceWatcher trait for mocking
//!
//! This trait abstracts the resolved resource handle so the dispatch pipeline
//! can be exercised without a running cluster. The concrete `ResourceHandle`
//! implements it, and tests can use `MockResourceWatcher`.

use crate::error::ClusterError;
use crate::watch::EventStream;

/// Something that can open a watch on one resource type.
#[async_trait::async_trait]
pub trait ResourceWatcher: Send + Sync {
    /// Opens a watch on the whole collection, or on the single object `name`.
    ///
    /// Dropping the returned stream stops the watch.
    async fn watch(&self, name: Option<&str>) -> Result<EventStream, ClusterError>;
}

#[async_trait::async_trait]
impl<T> ResourceWatcher for std::sync::Arc<T>
where
    T: ResourceWatcher + ?Sized,
{
    async fn watch(&self, name: Option<&str>) -> Result<EventStream, ClusterError> {
        (**self).watch(name).await
    }
}
