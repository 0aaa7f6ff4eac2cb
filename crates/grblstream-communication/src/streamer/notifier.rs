//! Notification queue and dispatch task
//!
//! Producers (reader and sender) never wait on the listener: events go into
//! a bounded queue with `try_send`, and a full queue drops the new event.

use grblstream_core::{StreamEvent, StreamListener};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Non-blocking producer side of the notification queue
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl EventSink {
    /// Create a sink and the receiver for the notifier
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue an event, dropping it if the queue is full or closed
    pub fn emit(&self, event: StreamEvent) {
        if let Err(e) = self.tx.try_send(event) {
            let kind = match &e {
                mpsc::error::TrySendError::Full(event) => event.kind(),
                mpsc::error::TrySendError::Closed(event) => event.kind(),
            };
            tracing::trace!("Dropped {} event: {}", kind, e);
        }
    }
}

/// Start the task that hands queued events to `listener`
///
/// The task runs until `active` turns false (or its sender is dropped), then
/// delivers whatever is already queued and exits.
pub fn spawn_notifier(
    mut events: mpsc::Receiver<StreamEvent>,
    listener: Arc<dyn StreamListener>,
    mut active: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event.dispatch(listener.as_ref()).await,
                    None => break,
                },
                changed = active.changed() => {
                    if changed.is_err() || !*active.borrow() {
                        break;
                    }
                }
            }
        }

        events.close();
        while let Some(event) = events.recv().await {
            event.dispatch(listener.as_ref()).await;
        }
        tracing::debug!("Notifier stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        received: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StreamListener for Recorder {
        async fn on_receive(&self, line: &str) {
            self.received.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (sink, mut rx) = EventSink::channel(2);
        sink.emit(StreamEvent::Received("a".into()));
        sink.emit(StreamEvent::Received("b".into()));
        sink.emit(StreamEvent::Received("c".into()));

        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Received("a".into()));
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Received("b".into()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_queued_events_delivered_on_shutdown() {
        let (sink, rx) = EventSink::channel(16);
        let (active_tx, active_rx) = watch::channel(true);
        let recorder = Arc::new(Recorder::default());

        sink.emit(StreamEvent::Received("ok".into()));
        sink.emit(StreamEvent::Received("ok".into()));
        let handle = spawn_notifier(rx, recorder.clone(), active_rx);
        active_tx.send(false).unwrap();
        handle.await.unwrap();

        assert_eq!(recorder.received.lock().unwrap().len(), 2);
        sink.emit(StreamEvent::Received("late".into()));
        assert_eq!(recorder.received.lock().unwrap().len(), 2);
    }
}
