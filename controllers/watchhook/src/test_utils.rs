//! Test utilities for pipeline tests
//!
//! This module provides a recording hook and helpers for building targets.

#[cfg(test)]
use crate::error::ControllerError;
#[cfg(test)]
use crate::hook::Hook;
#[cfg(test)]
use cluster_client::{EventType, ObjectEvent, ResourceRef, WatchTarget};
#[cfg(test)]
use std::sync::Mutex;
#[cfg(test)]
use std::time::{Duration, Instant};
#[cfg(test)]
use tokio::sync::Notify;

/// One hook call as seen by [`RecordingHook`]
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Invocation {
    pub event_type: EventType,
    pub name: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Hook that records every call, optionally sleeping and failing on a name
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingHook {
    delay: Duration,
    fail_on: Option<String>,
    calls: Mutex<Vec<Invocation>>,
    started: Notify,
}

#[cfg(test)]
impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// `(event type, object name)` of each call, in call order
    pub fn seen(&self) -> Vec<(EventType, String)> {
        self.calls()
            .into_iter()
            .map(|call| (call.event_type, call.name))
            .collect()
    }

    /// Resolves once a call has started; a start before the wait also counts
    pub async fn wait_for_start(&self) {
        self.started.notified().await;
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl Hook for RecordingHook {
    async fn invoke(&self, event: &ObjectEvent) -> Result<(), ControllerError> {
        let started = Instant::now();
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;

        let name = event.object.metadata.name.clone().unwrap_or_default();
        self.calls.lock().unwrap().push(Invocation {
            event_type: event.event_type,
            name: name.clone(),
            started,
            finished: Instant::now(),
        });

        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(ControllerError::CommandInvocation {
                program: "recording-hook".to_string(),
                reason: format!("exit status: 1 (refused {name})"),
            });
        }
        Ok(())
    }
}

/// Helper to create a ConfigMap watch target in `default`
#[cfg(test)]
pub fn create_test_target(name: Option<&str>) -> WatchTarget {
    WatchTarget {
        resource_ref: ResourceRef::parse("configmap"),
        namespace: "default".to_string(),
        name: name.map(str::to_string),
    }
}
