//! Watch event types.
//!
//! The watch source hands out an [`EventStream`]: server-ordered object
//! events, with the server's `ERROR` events and transport failures surfaced
//! as [`WatchError`] items. The stream ends when the server closes the watch.
//! Dropping the stream releases the underlying connection.

use crate::error::WatchError;
use crate::resource_ref::ResourceRef;
use futures::stream::BoxStream;
use kube::api::{DynamicObject, WatchEvent};
use std::fmt;

/// Ordered stream of watch events for one target.
pub type EventStream = BoxStream<'static, Result<ObjectEvent, WatchError>>;

/// Object-carrying watch event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

impl EventType {
    /// The label appended to the hook command line.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Modified => "MODIFIED",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single change notification and the object it carries.
#[derive(Debug, Clone)]
pub struct ObjectEvent {
    pub event_type: EventType,
    pub object: DynamicObject,
}

impl ObjectEvent {
    #[must_use]
    pub fn new(event_type: EventType, object: DynamicObject) -> Self {
        Self { event_type, object }
    }

    /// `namespace/name` of the carried object, for log lines.
    #[must_use]
    pub fn object_key(&self) -> String {
        let name = self.object.metadata.name.as_deref().unwrap_or("<unknown>");
        match self.object.metadata.namespace.as_deref() {
            Some(ns) => format!("{ns}/{name}"),
            None => name.to_string(),
        }
    }
}

/// What to watch: a resource type in a namespace, optionally one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub resource_ref: ResourceRef,
    pub namespace: String,
    pub name: Option<String>,
}

impl WatchTarget {
    /// True when the watch is scoped to a single named instance.
    #[must_use]
    pub fn is_single_object(&self) -> bool {
        self.name.is_some()
    }
}

/// Maps one item of the raw watch stream onto the stream item type.
///
/// Transport failures become [`WatchError::Stream`].
pub(crate) fn from_raw(
    item: Result<WatchEvent<DynamicObject>, kube::Error>,
) -> Option<Result<ObjectEvent, WatchError>> {
    match item {
        Ok(event) => convert(event),
        Err(e) => Some(Err(WatchError::Stream(e))),
    }
}

/// Maps a raw watch event onto the stream item type.
///
/// Returns `None` for bookmarks, which carry no object.
pub(crate) fn convert(
    event: WatchEvent<DynamicObject>,
) -> Option<Result<ObjectEvent, WatchError>> {
    match event {
        WatchEvent::Added(obj) => Some(Ok(ObjectEvent::new(EventType::Added, obj))),
        WatchEvent::Modified(obj) => Some(Ok(ObjectEvent::new(EventType::Modified, obj))),
        WatchEvent::Deleted(obj) => Some(Ok(ObjectEvent::new(EventType::Deleted, obj))),
        WatchEvent::Bookmark(_) => None,
        WatchEvent::Error(status) => Some(Err(WatchError::ErrorEvent(format!(
            "{} ({}): {}",
            status.code, status.reason, status.message
        )))),
    }
}
