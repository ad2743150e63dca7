//! The machine handle and its dispatcher task.

use crate::analyzer::Analyzer;
use crate::builder::{BuildError, MachineBuilder};
use crate::core::{Event, State, StateHistory, StateOfMind};
use crate::engine::dispatch::dispatch_event;
use crate::engine::error::EngineError;
use crate::export::{render, DiagramFormat};
use crate::graph::Graph;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

const BROADCAST_CAPACITY: usize = 64;

struct Envelope<S: State, E: Event> {
    event: E,
    done: oneshot::Sender<Result<StateOfMind<S>, EngineError>>,
}

struct Shared<S: State> {
    mind: RwLock<StateOfMind<S>>,
    history: RwLock<StateHistory<S>>,
    updates: broadcast::Sender<StateOfMind<S>>,
}

/// A running hierarchical state machine.
///
/// `Machine` is a cheap handle: clones share the graph, the event queue
/// and the published configuration, so callbacks and other tasks can hold
/// their own copy and submit events.
///
/// Events are applied strictly in submission order. The dispatcher task is
/// the machine's serialization point: it processes one event at a time,
/// awaiting guards, effects and lifecycle callbacks before touching the
/// next event, so concurrent `apply` calls never interleave.
pub struct Machine<S: State, E: Event> {
    graph: Arc<Graph<S, E>>,
    sender: mpsc::UnboundedSender<Envelope<S, E>>,
    shared: Arc<Shared<S>>,
}

impl<S: State, E: Event> Clone for Machine<S, E> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            sender: self.sender.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: State, E: Event> Machine<S, E> {
    /// Build a machine from a declarative graph description.
    ///
    /// Equivalent to configuring a [`MachineBuilder`] by hand; `production`
    /// toggles production mode for both analysis and unmatched-event
    /// handling. Must be called within a tokio runtime.
    pub fn create<F>(build: F, production: bool) -> Result<Self, BuildError>
    where
        F: FnOnce(MachineBuilder<S, E>) -> MachineBuilder<S, E>,
    {
        build(MachineBuilder::new()).production(production).build()
    }

    /// Freeze the graph and spawn the dispatcher task.
    pub(crate) fn start(graph: Graph<S, E>, production: bool) -> Self {
        let graph = Arc::new(graph);
        let paths = graph
            .entry_chains(graph.initial)
            .iter()
            .map(|chain| graph.path_of(chain))
            .collect();
        let initial_mind = StateOfMind::new(paths);

        let (sender, receiver) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
        let shared = Arc::new(Shared {
            mind: RwLock::new(initial_mind.clone()),
            history: RwLock::new(StateHistory::new()),
            updates,
        });

        spawn_dispatcher(
            Arc::clone(&graph),
            Arc::clone(&shared),
            receiver,
            initial_mind,
            production,
        );

        Self {
            graph,
            sender,
            shared,
        }
    }

    /// Enqueue an event and return a handle resolving to the post-event
    /// configuration.
    ///
    /// The event is queued synchronously, so it is dispatched even when
    /// the handle is dropped without being awaited. Submissions from
    /// inside guards, effects or lifecycle callbacks are processed after
    /// the current transition completes; such callbacks must not await
    /// their own handle.
    pub fn apply(&self, event: E) -> ApplyHandle<S> {
        let (done, receiver) = oneshot::channel();
        debug!(trigger = event.name(), "event enqueued");
        match self.sender.send(Envelope { event, done }) {
            Ok(()) => ApplyHandle {
                receiver: Some(receiver),
            },
            Err(_) => ApplyHandle { receiver: None },
        }
    }

    /// True if any active path passes through `kind` (the current leaf or
    /// any of its ancestors). Unregistered kinds are never active.
    pub fn is_in(&self, kind: &S) -> bool {
        self.shared
            .mind
            .read()
            .expect("state lock poisoned")
            .contains(kind)
    }

    /// Snapshot of the active configuration.
    pub fn state_of_mind(&self) -> StateOfMind<S> {
        self.shared
            .mind
            .read()
            .expect("state lock poisoned")
            .clone()
    }

    /// Snapshot of the executed-transition history.
    pub fn history(&self) -> StateHistory<S> {
        self.shared
            .history
            .read()
            .expect("history lock poisoned")
            .clone()
    }

    /// Subscribe to every configuration published after a dispatched
    /// event. Lagging or dropped subscribers never affect dispatch.
    pub fn subscribe(&self) -> broadcast::Receiver<StateOfMind<S>> {
        self.shared.updates.subscribe()
    }

    /// Re-run static analysis, logging every violation found.
    pub fn analyze(&self) -> bool {
        Analyzer::new(self.graph.as_ref()).report()
    }

    /// The frozen state graph.
    pub fn graph(&self) -> &Graph<S, E> {
        &self.graph
    }

    /// Render the graph and write it to `path`.
    pub async fn export(
        &self,
        path: impl AsRef<Path>,
        format: DiagramFormat,
    ) -> std::io::Result<()> {
        let text = render(self.graph.as_ref(), format);
        tokio::fs::write(path, text).await
    }
}

/// Future side of [`Machine::apply`].
///
/// Resolves to the configuration after the event was dispatched, or to the
/// failure the dispatch produced. Dropping the handle does not cancel the
/// event.
pub struct ApplyHandle<S: State> {
    receiver: Option<oneshot::Receiver<Result<StateOfMind<S>, EngineError>>>,
}

impl<S: State> Future for ApplyHandle<S> {
    type Output = Result<StateOfMind<S>, EngineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.receiver.as_mut() {
            None => Poll::Ready(Err(EngineError::Stopped)),
            Some(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(_)) => Poll::Ready(Err(EngineError::Stopped)),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

fn spawn_dispatcher<S: State, E: Event>(
    graph: Arc<Graph<S, E>>,
    shared: Arc<Shared<S>>,
    mut receiver: mpsc::UnboundedReceiver<Envelope<S, E>>,
    mut mind: StateOfMind<S>,
    production: bool,
) {
    tokio::spawn(async move {
        while let Some(Envelope { event, done }) = receiver.recv().await {
            debug!(trigger = event.name(), "dispatching event");
            match dispatch_event(graph.as_ref(), &mut mind, &event).await {
                Ok(records) => {
                    *shared.mind.write().expect("state lock poisoned") = mind.clone();
                    if !records.is_empty() {
                        let mut history =
                            shared.history.write().expect("history lock poisoned");
                        let mut updated = history.clone();
                        for record in records {
                            updated = updated.record(record);
                        }
                        *history = updated;
                    }
                    let _ = shared.updates.send(mind.clone());
                    let _ = done.send(Ok(mind.clone()));
                }
                Err(error) => {
                    if production && matches!(error, EngineError::InvalidTransition { .. }) {
                        warn!(%error, "event ignored in production mode");
                        let _ = done.send(Ok(mind.clone()));
                    } else {
                        let _ = done.send(Err(error));
                    }
                }
            }
        }
    });
}
