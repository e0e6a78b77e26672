//! Watch stream consumer.
//!
//! Reads events from the watch stream and pushes them into the hand-off
//! queue until a terminal condition. The stream and the queue sender are
//! owned here, so returning releases the watch and closes the queue.

use crate::controller::Termination;
use crate::error::ControllerError;
use cluster_client::{EventStream, EventType, ObjectEvent};
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Forwards events into `queue` in stream order.
///
/// Stops on: the stop signal (or its sender being dropped), the server
/// closing the stream, an error event, the worker going away, or a deletion
/// when `single_object` is set. In the last case the deletion is enqueued
/// before returning.
pub async fn forward_events(
    mut events: EventStream,
    queue: mpsc::Sender<ObjectEvent>,
    single_object: bool,
    mut stop: oneshot::Receiver<()>,
) -> Result<Termination, ControllerError> {
    loop {
        let item = tokio::select! {
            biased;
            _ = &mut stop => return Ok(Termination::Interrupted),
            item = events.next() => item,
        };

        let event = match item {
            Some(Ok(event)) => event,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(ControllerError::WatchClosed),
        };

        let deleted = event.event_type == EventType::Deleted;
        debug!("Received {} for {}", event.event_type, event.object_key());

        tokio::select! {
            biased;
            _ = &mut stop => return Ok(Termination::Interrupted),
            sent = queue.send(event) => {
                if sent.is_err() {
                    debug!("Hand-off queue closed by worker");
                    return Ok(Termination::WorkerStopped);
                }
            }
        }

        if deleted {
            info!("object deleted");
            if single_object {
                return Ok(Termination::ObjectDeleted);
            }
        }
    }
}
