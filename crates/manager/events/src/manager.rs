//! The pair of queues owned by one wallet manager.

use crate::{
    EventCoreConfig, EventQueue, EventQueueError, EwmListener, ListenerDispatcher, ListenerEvent,
    ListenerSignal, MainDispatcher, MainEvent, MainSignal, ManagerState, TypedEvent,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The running listener and main queues of a wallet manager.
///
/// Both consumers are spawned on the current tokio runtime and live until
/// [EwmEvents::shutdown] or until the parent cancellation token fires. Main queue dispatch
/// reports to the listener queue, so a listener notification caused by a main event is always
/// dispatched after that main event started dispatching.
///
/// Only the main queue follows the parent token. The listener queue is cancelled once the main
/// consumer has returned, so every notification signalled while the main queue drains is
/// still accepted.
#[derive(Debug)]
pub struct EwmEvents<L, S> {
    main: MainSignal,
    listener: ListenerSignal,
    main_token: CancellationToken,
    listener_token: CancellationToken,
    main_task: JoinHandle<MainDispatcher<S>>,
    listener_task: JoinHandle<ListenerDispatcher<L>>,
}

impl<L, S> EwmEvents<L, S>
where
    L: EwmListener,
    S: ManagerState,
{
    /// Spawns both queue consumers.
    pub fn spawn(
        config: EventCoreConfig,
        cancel_token: &CancellationToken,
        listener: L,
        state: S,
    ) -> Self {
        let listener_token = CancellationToken::new();
        let main_token = cancel_token.child_token();

        let (listener_queue, listener_signal) =
            EventQueue::new(ListenerDispatcher::new(listener), config, listener_token.clone());
        let (main_queue, main_signal) = EventQueue::new(
            MainDispatcher::new(state, listener_signal.clone()),
            config,
            main_token.clone(),
        );

        info!(target: "ewm::events::queue", ?config, "Spawning wallet manager event queues");
        let listener_task = tokio::spawn(listener_queue.start());
        let main_task = {
            let listener_guard = listener_token.clone().drop_guard();
            tokio::spawn(async move {
                let _listener_guard = listener_guard;
                main_queue.start().await
            })
        };

        Self {
            main: main_signal,
            listener: listener_signal,
            main_token,
            listener_token,
            main_task,
            listener_task,
        }
    }

    /// Returns the submission handle of the main queue.
    pub const fn main(&self) -> &MainSignal {
        &self.main
    }

    /// Returns the submission handle of the listener queue.
    pub const fn listener(&self) -> &ListenerSignal {
        &self.listener
    }

    /// Stops both queues and returns the listener and the state.
    ///
    /// The main queue stops first, so listener events it signals while shutting down are
    /// still delivered under [crate::ShutdownPolicy::Drain].
    pub async fn shutdown(self) -> Result<(L, S), EventQueueError> {
        self.main_token.cancel();
        let main = self
            .main_task
            .await
            .map_err(|source| EventQueueError::Join { queue: MainEvent::QUEUE, source })?;

        self.listener_token.cancel();
        let listener = self
            .listener_task
            .await
            .map_err(|source| EventQueueError::Join { queue: ListenerEvent::QUEUE, source })?;

        Ok((listener.into_listener(), main.into_state()))
    }
}
