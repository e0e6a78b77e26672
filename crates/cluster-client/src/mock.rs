//! Mock ResourceWatcher for unit testing
//!
//! Events are pushed by the test through a [`MockEventSender`] and delivered
//! in order on the stream returned by `watch`. Dropping the sender ends the
//! stream, as if the server had closed the watch.

use crate::error::{ClusterError, WatchError};
use crate::watch::{EventStream, EventType, ObjectEvent};
use crate::watcher_trait::ResourceWatcher;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{StreamExt, stream};
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Item = Result<ObjectEvent, WatchError>;

/// Mock watcher backed by an in-memory channel.
#[derive(Debug)]
pub struct MockResourceWatcher {
    receiver: Mutex<Option<UnboundedReceiver<Item>>>,
    watched_names: Mutex<Vec<Option<String>>>,
    releases: Arc<AtomicUsize>,
}

/// Test-side handle feeding the mock stream.
#[derive(Debug, Clone)]
pub struct MockEventSender {
    sender: UnboundedSender<Item>,
}

impl MockResourceWatcher {
    /// Create a new mock watcher and the sender that feeds it
    pub fn new() -> (Self, MockEventSender) {
        let (sender, receiver) = mpsc::unbounded();
        let watcher = Self {
            receiver: Mutex::new(Some(receiver)),
            watched_names: Mutex::new(Vec::new()),
            releases: Arc::new(AtomicUsize::new(0)),
        };
        (watcher, MockEventSender { sender })
    }

    /// Number of times the watch stream has been released
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Names passed to each `watch` call
    pub fn watched_names(&self) -> Vec<Option<String>> {
        self.watched_names.lock().unwrap().clone()
    }

    /// Shared release counter, observable after the watcher is moved away
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        self.releases.clone()
    }
}

#[async_trait::async_trait]
impl ResourceWatcher for MockResourceWatcher {
    async fn watch(&self, name: Option<&str>) -> Result<EventStream, ClusterError> {
        self.watched_names.lock().unwrap().push(name.map(str::to_string));

        let receiver = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ClusterError::Config("mock watch already opened".to_string()))?;

        let guard = ReleaseGuard(self.releases.clone());
        let stream = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
            receiver.next().await.map(|item| (item, (receiver, guard)))
        });
        Ok(stream.boxed())
    }
}

impl MockEventSender {
    /// Queue an object event
    pub fn send(&self, event_type: EventType, object: DynamicObject) {
        let _ = self.sender.unbounded_send(Ok(ObjectEvent::new(event_type, object)));
    }

    /// Queue a server `ERROR` event
    pub fn send_error(&self, message: &str) {
        let _ = self
            .sender
            .unbounded_send(Err(WatchError::ErrorEvent(message.to_string())));
    }

    /// End the stream, as if the server closed the watch
    pub fn close(&self) {
        self.sender.close_channel();
    }
}

/// Counts a release when the stream state is dropped.
#[derive(Debug)]
struct ReleaseGuard(Arc<AtomicUsize>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Create a test ConfigMap object in `default`
pub fn config_map(name: &str) -> DynamicObject {
    let ar = ApiResource::from_gvk(&GroupVersionKind::gvk("", "v1", "ConfigMap"));
    DynamicObject::new(name, &ar)
        .within("default")
        .data(serde_json::json!({ "data": { "key": name } }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_delivers_in_order_and_releases_once() {
        let (watcher, sender) = MockResourceWatcher::new();
        sender.send(EventType::Added, config_map("a"));
        sender.send(EventType::Modified, config_map("a"));
        sender.close();

        let mut stream = watcher.watch(Some("a")).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.event_type, EventType::Added);
        assert_eq!(second.event_type, EventType::Modified);
        assert!(stream.next().await.is_none());
        assert_eq!(watcher.releases(), 1);

        drop(stream);
        assert_eq!(watcher.releases(), 1);
        assert_eq!(watcher.watched_names(), vec![Some("a".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_release_on_drop() {
        let (watcher, _sender) = MockResourceWatcher::new();
        let stream = watcher.watch(None).await.unwrap();
        assert_eq!(watcher.releases(), 0);
        drop(stream);
        assert_eq!(watcher.releases(), 1);
    }

    #[tokio::test]
    async fn test_mock_watch_only_once() {
        let (watcher, _sender) = MockResourceWatcher::new();
        let _stream = watcher.watch(None).await.unwrap();
        assert!(watcher.watch(None).await.is_err());
    }
}
