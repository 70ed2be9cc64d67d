//! The single-consumer FIFO event queue.

use crate::{DispatchError, EventCoreConfig, EventQueueError, ShutdownPolicy, metrics::Metrics};
use async_trait::async_trait;
use futures::FutureExt;
use std::{any::Any, fmt::Debug, panic::AssertUnwindSafe, time::Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

/// An event that can travel through an [EventQueue].
pub trait TypedEvent: Debug + Send + 'static {
    /// The label of the queue carrying this event type.
    const QUEUE: &'static str;

    /// The labels of every kind of this event type.
    const LABELS: &'static [&'static str];

    /// Returns the diagnostic name of the event's kind.
    fn name(&self) -> &'static str;

    /// Returns the label of the event's kind, one of [TypedEvent::LABELS].
    fn label(&self) -> &'static str;
}

/// Applies the events popped by an [EventQueue].
///
/// The dispatcher is owned by the queue's consumer task, so [EventDispatcher::dispatch] is
/// never called concurrently and may mutate the dispatcher freely.
///
/// A panic inside [EventDispatcher::dispatch] is caught and the same dispatcher receives the
/// next event. Any state the panicking call had already changed stays changed, so
/// implementations should apply updates only once every fallible step has succeeded.
#[async_trait]
pub trait EventDispatcher: Send + 'static {
    /// The event type dispatched.
    type Event: TypedEvent;

    /// Dispatches one event.
    async fn dispatch(&mut self, event: Self::Event) -> Result<(), DispatchError>;
}

/// The producer side of an [EventQueue].
///
/// Cheap to clone and safe to use from any thread. Submission never blocks.
#[derive(Debug)]
pub struct EventSender<E> {
    sender: mpsc::UnboundedSender<E>,
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<E: TypedEvent> EventSender<E> {
    pub(crate) const fn new(sender: mpsc::UnboundedSender<E>) -> Self {
        Self { sender }
    }

    /// Submits an event. Fails only once the queue has shut down.
    pub fn signal(&self, event: E) -> Result<(), EventQueueError> {
        self.sender.send(event).map_err(|_| EventQueueError::Closed { queue: E::QUEUE })
    }

    /// Returns `true` if the queue no longer accepts events.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// An unbounded FIFO of events drained by a single consumer.
///
/// [EventQueue::start] runs the consumer loop: it suspends while the queue is empty and
/// dispatches events one at a time in submission order. A failing or panicking dispatch is
/// logged and counted, and the loop moves on.
#[derive(Debug)]
pub struct EventQueue<D: EventDispatcher> {
    dispatcher: D,
    config: EventCoreConfig,
    cancel_token: CancellationToken,
    event_rx: mpsc::UnboundedReceiver<D::Event>,
}

impl<D: EventDispatcher> EventQueue<D> {
    /// Creates a new [EventQueue] and the [EventSender] feeding it.
    pub fn new(
        dispatcher: D,
        config: EventCoreConfig,
        cancel_token: CancellationToken,
    ) -> (Self, EventSender<D::Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { dispatcher, config, cancel_token, event_rx }, EventSender::new(event_tx))
    }

    /// Runs the consumer loop until the cancellation token fires or every sender is dropped,
    /// then hands the dispatcher back.
    ///
    /// On cancellation the queue stops accepting events and, per the [ShutdownPolicy], either
    /// dispatches or drops whatever is still queued.
    pub async fn start(mut self) -> D {
        let queue = D::Event::QUEUE;
        info!(target: "ewm::events::queue", queue, "Starting event queue");

        if self.config.metrics_enabled {
            Metrics::init(queue, D::Event::LABELS);
        }

        loop {
            tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => {
                    info!(
                        target: "ewm::events::queue",
                        queue,
                        "Event queue cancellation requested, stopping..."
                    );
                    break;
                }
                maybe_event = self.event_rx.recv() => {
                    if let Some(event) = maybe_event {
                        self.dispatch(event).await;
                    } else {
                        info!(
                            target: "ewm::events::queue",
                            queue,
                            "All event senders dropped, stopping event queue"
                        );
                        return self.dispatcher;
                    }
                }
            }
        }

        self.shutdown().await;
        self.dispatcher
    }

    async fn shutdown(&mut self) {
        let queue = D::Event::QUEUE;
        self.event_rx.close();

        match self.config.shutdown {
            ShutdownPolicy::Drain => {
                let mut drained = 0usize;
                while let Some(event) = self.event_rx.recv().await {
                    self.dispatch(event).await;
                    drained += 1;
                }
                info!(target: "ewm::events::queue", queue, drained, "Event queue drained");
            }
            ShutdownPolicy::Abandon => {
                let mut abandoned = 0usize;
                while self.event_rx.try_recv().is_ok() {
                    abandoned += 1;
                }
                if abandoned > 0 {
                    warn!(
                        target: "ewm::events::queue",
                        queue,
                        abandoned,
                        "Abandoned queued events on shutdown"
                    );
                }
            }
        }
    }

    async fn dispatch(&mut self, event: D::Event) {
        let queue = D::Event::QUEUE;
        let (name, kind) = (event.name(), event.label());
        trace!(target: "ewm::events::queue", queue, ?event, "Dispatching event");

        let started = Instant::now();
        let result = AssertUnwindSafe(self.dispatcher.dispatch(event))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DispatchError::Panicked(panic_message(panic.as_ref()))));
        Metrics::record_dispatch(queue, kind, &result, started.elapsed());

        if let Err(err) = result {
            warn!(target: "ewm::events::queue", queue, event = name, %err, "Event dispatch failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}
