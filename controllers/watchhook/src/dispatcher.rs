//! Hand-off queue worker.

use crate::error::ControllerError;
use crate::hook::Hook;
use cluster_client::ObjectEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Runs the hook once per queued event, strictly one at a time.
///
/// Returns the number of dispatched events once the queue is closed and
/// empty. The first hook failure stops the worker; events still queued are
/// dropped with the receiver.
pub async fn dispatch_events<H>(
    mut queue: mpsc::Receiver<ObjectEvent>,
    hook: Arc<H>,
) -> Result<usize, ControllerError>
where
    H: Hook + ?Sized,
{
    let mut dispatched = 0;
    while let Some(event) = queue.recv().await {
        hook.invoke(&event).await?;
        dispatched += 1;
    }
    debug!("Hand-off queue drained after {} events", dispatched);
    Ok(dispatched)
}
