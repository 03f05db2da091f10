//! The Runner — queue, dispatcher, worker slots, lifecycle, trace access.

use crate::config::{build_orchestrator, ConfigError, OrchestrationConfig, RunnerConfig};
use axon_core::{
    AgentHandler, AgentId, AgentResult, Callback, CallbackArgs, CallbackError, EmitError, Event,
    EventEmitter, Hook, OrchError, SessionId, State, TraceEntry, SESSION_ID_KEY,
};
use axon_orch::Orchestrator;
use axon_trace::{TraceCallback, TraceLogger};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::{AbortHandle, JoinError, JoinHandle, JoinSet};

/// Runner lifecycle and delegation errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RunnerError {
    /// `start` was called on a runner that is already running.
    #[error("runner already started")]
    AlreadyStarted,

    /// Event submission failed.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// A synchronous dispatch failed.
    #[error(transparent)]
    Orch(#[from] OrchError),

    /// The supplied configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Callback registration was rejected.
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

/// A cheap, cloneable submission handle onto a runner's queue.
///
/// This is what the runner binds into its orchestrator as the
/// [`EventEmitter`] for re-routed successor events, and what callers can
/// hold to submit events from other tasks.
#[derive(Clone)]
pub struct RunnerHandle {
    tx: mpsc::Sender<Event>,
    stopping: Arc<AtomicBool>,
}

impl RunnerHandle {
    fn prepare(&self, event: Event) -> Result<Event, EmitError> {
        if self.stopping.load(Ordering::SeqCst) {
            return Err(EmitError::RunnerStopped);
        }
        prepare_event(event)
    }
}

impl EventEmitter for RunnerHandle {
    fn emit(&self, event: Event) -> Result<(), EmitError> {
        let event = self.prepare(event)?;
        self.tx.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => EmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EmitError::RunnerStopped,
        })
    }
}

/// Validate an event and fill in a generated session id when absent.
/// Every event carries a non-empty session id past this point.
fn prepare_event(mut event: Event) -> Result<Event, EmitError> {
    if event.id.is_empty() {
        return Err(EmitError::InvalidEvent("event id must not be empty".into()));
    }
    if event.session_id().is_none() {
        event
            .metadata
            .insert(SESSION_ID_KEY.to_owned(), SessionId::generate().to_string());
    }
    Ok(event)
}

/// The lifecycle owner: bounded FIFO queue, dispatcher, bounded worker
/// slots, graceful shutdown, and per-session trace access.
///
/// Ordering: emit order is preserved at queue ingress per submitter. Across
/// sessions, processing order is unspecified — workers run in parallel.
pub struct Runner {
    config: RunnerConfig,
    dispatch_timeout: Option<Duration>,
    orchestrator: Arc<dyn Orchestrator>,
    trace: Arc<TraceLogger>,
    handle: RunnerHandle,
    rx: Mutex<Option<mpsc::Receiver<Event>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    started: AtomicBool,
}

impl Runner {
    /// Create a runner over the given orchestrator.
    ///
    /// Installs the trace callback under `Hook::All` and binds the runner's
    /// handle as the orchestrator's emitter, so re-routed successor events
    /// land back on this queue.
    pub async fn new(
        config: RunnerConfig,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let (shutdown_tx, _) = watch::channel(false);
        let handle = RunnerHandle {
            tx,
            stopping: Arc::new(AtomicBool::new(false)),
        };

        let trace = Arc::new(TraceLogger::new());
        let trace_callback: Arc<dyn Callback> = Arc::new(TraceCallback::new(Arc::clone(&trace)));
        orchestrator
            .callbacks()
            .register(Hook::All, "trace", trace_callback)
            .await?;
        orchestrator.set_emitter(Arc::new(handle.clone()));

        Ok(Self {
            config,
            dispatch_timeout: None,
            orchestrator,
            trace,
            handle,
            rx: Mutex::new(Some(rx)),
            dispatcher: Mutex::new(None),
            shutdown_tx,
            started: AtomicBool::new(false),
        })
    }

    /// Build a runner from validated runner + orchestration configs.
    ///
    /// `max_concurrency` in the orchestration config, when set, overrides
    /// the runner's worker count; `timeout_seconds` becomes the dispatch
    /// deadline.
    pub async fn from_config(
        mut runner_config: RunnerConfig,
        orchestration: &OrchestrationConfig,
    ) -> Result<Self, RunnerError> {
        let orchestrator = build_orchestrator(orchestration)?;
        if let Some(workers) = orchestration.max_concurrency {
            runner_config.workers = workers;
        }
        let mut runner = Self::new(runner_config, orchestrator).await?;
        runner.dispatch_timeout = orchestration.timeout();
        Ok(runner)
    }

    /// Set a deadline applied to every dispatch (builder pattern).
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    /// Spawn the dispatcher and start draining the queue.
    ///
    /// Idempotence guard: a second call fails with `AlreadyStarted`; a call
    /// after `stop` fails with the stopped error.
    pub fn start(&self) -> Result<(), RunnerError> {
        if self.handle.stopping.load(Ordering::SeqCst) {
            return Err(EmitError::RunnerStopped.into());
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RunnerError::AlreadyStarted);
        }
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or(RunnerError::AlreadyStarted)?;

        let dispatcher = tokio::spawn(dispatcher_loop(
            rx,
            self.shutdown_tx.subscribe(),
            Arc::clone(&self.orchestrator),
            self.dispatch_timeout,
            self.config.workers,
            self.config.stop_grace(),
        ));
        *self
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(dispatcher);
        tracing::info!(
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            "axon.runner.start"
        );
        Ok(())
    }

    /// Non-blocking enqueue. Fails fast when the queue is full or the
    /// runner is stopping; fills in a generated session id when absent.
    pub fn emit(&self, event: Event) -> Result<(), EmitError> {
        self.handle.emit(event)
    }

    /// A cloneable submission handle for other tasks.
    pub fn handle(&self) -> RunnerHandle {
        self.handle.clone()
    }

    /// The synchronous dispatch variant: run the full event lifecycle
    /// (event-level hooks, orchestrator dispatch, deadline) inline and
    /// return the per-event result. Works with or without `start`.
    pub async fn dispatch_sync(&self, event: Event) -> Result<AgentResult, RunnerError> {
        if self.handle.stopping.load(Ordering::SeqCst) {
            return Err(EmitError::RunnerStopped.into());
        }
        let event = prepare_event(event)?;
        process_event(&self.orchestrator, self.dispatch_timeout, event)
            .await
            .map_err(RunnerError::from)
    }

    /// Drain the queue and shut down.
    ///
    /// New submissions fail immediately; events already queued are still
    /// processed; in-flight handlers get the configured grace period, then
    /// their tasks are aborted. Safe to call more than once.
    pub async fn stop(&self) {
        self.handle.stopping.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(dispatcher) = dispatcher {
            if let Err(err) = dispatcher.await {
                tracing::error!(error = %err, "axon.runner.dispatcher_lost");
            }
        }
        self.orchestrator.stop();
        tracing::info!("axon.runner.stop");
    }

    /// Register a handler with the bound orchestrator.
    pub async fn register_agent(
        &self,
        name: impl Into<AgentId>,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), RunnerError> {
        self.orchestrator
            .register_agent(name.into(), handler)
            .await
            .map_err(RunnerError::from)
    }

    /// Register a callback with the orchestrator's registry.
    pub async fn register_callback(
        &self,
        hook: Hook,
        name: impl Into<String>,
        callback: Arc<dyn Callback>,
    ) -> Result<(), RunnerError> {
        self.orchestrator
            .callbacks()
            .register(hook, name, callback)
            .await
            .map_err(RunnerError::from)
    }

    /// Remove a callback from the orchestrator's registry.
    pub async fn unregister_callback(&self, hook: Hook, name: &str) {
        self.orchestrator.callbacks().unregister(hook, name).await;
    }

    /// Ordered copy of a session's trace. Empty for unknown sessions.
    pub async fn dump_trace(&self, session: &SessionId) -> Vec<TraceEntry> {
        self.trace.trace(session).await
    }

    /// The shared trace logger.
    pub fn trace_logger(&self) -> Arc<TraceLogger> {
        Arc::clone(&self.trace)
    }
}

/// Aborts a spawned dispatch task unless disarmed. A worker aborted
/// mid-await would otherwise leave its dispatch task running detached.
struct AbortGuard(Option<AbortHandle>);

impl AbortGuard {
    fn new(handle: AbortHandle) -> Self {
        Self(Some(handle))
    }

    fn disarm(&mut self) {
        self.0 = None;
    }

    fn abort_now(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if let Some(handle) = &self.0 {
            handle.abort();
        }
    }
}

async fn dispatcher_loop(
    mut rx: mpsc::Receiver<Event>,
    mut shutdown: watch::Receiver<bool>,
    orchestrator: Arc<dyn Orchestrator>,
    timeout: Option<Duration>,
    workers: usize,
    grace: Duration,
) {
    let slots = Arc::new(Semaphore::new(workers));
    let mut pool = JoinSet::new();
    let mut draining = false;

    loop {
        let event = if draining {
            match rx.recv().await {
                Some(event) => event,
                None => break,
            }
        } else {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(event) => event,
                    None => break,
                },
                _ = shutdown.changed() => {
                    // Reject new sends, keep draining what's buffered.
                    rx.close();
                    draining = true;
                    continue;
                }
            }
        };

        // Reap finished workers so the pool doesn't accumulate results.
        while pool.try_join_next().is_some() {}

        let permit = match Arc::clone(&slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let orchestrator = Arc::clone(&orchestrator);
        pool.spawn(async move {
            let _slot = permit;
            let _ = process_event(&orchestrator, timeout, event).await;
        });
    }

    // Queue is drained; give in-flight handlers the grace period, then
    // abort what's left.
    let drain = async {
        while pool.join_next().await.is_some() {}
    };
    if tokio::time::timeout(grace, drain).await.is_err() {
        tracing::warn!(grace = ?grace, "axon.runner.grace_elapsed");
        pool.shutdown().await;
    }
}

/// One event's full lifecycle: event-level hooks around an isolated,
/// optionally deadlined orchestrator dispatch.
async fn process_event(
    orchestrator: &Arc<dyn Orchestrator>,
    timeout: Option<Duration>,
    event: Event,
) -> Result<AgentResult, OrchError> {
    let registry = orchestrator.callbacks();
    let seed = State::from_event(&event);
    let before = CallbackArgs::new(Hook::BeforeEventHandling, event.clone(), seed);
    let (pre_state, _) = registry.invoke(before).await;

    // The dispatch runs in its own task so a panicking handler is contained
    // at the task boundary instead of unwinding through the worker.
    let dispatch_orchestrator = Arc::clone(orchestrator);
    let dispatch_event = event.clone();
    let task = tokio::spawn(async move { dispatch_orchestrator.dispatch(dispatch_event).await });
    let mut guard = AbortGuard::new(task.abort_handle());

    let outcome = match timeout {
        Some(deadline) => match tokio::time::timeout(deadline, task).await {
            Ok(joined) => {
                guard.disarm();
                flatten_join(joined, &event)
            }
            Err(_) => {
                guard.abort_now();
                Err(OrchError::Timeout(deadline))
            }
        },
        None => {
            let joined = task.await;
            guard.disarm();
            flatten_join(joined, &event)
        }
    };

    match &outcome {
        Ok(result) => {
            let after = CallbackArgs::new(
                Hook::AfterEventHandling,
                event.clone(),
                result.output_state.clone(),
            )
            .with_result(result.clone());
            registry.invoke(after).await;
        }
        Err(err) => {
            // Handler failures already produced agent-scoped error-hook
            // entries inside the orchestrator; hook the rest here so no
            // event vanishes without a trace.
            if !agent_scoped(err) {
                let args = CallbackArgs::new(Hook::AgentError, event.clone(), pre_state)
                    .with_error(err.to_string());
                registry.invoke(args).await;
            }
            tracing::error!(event = %event.id, error = %err, "axon.runner.dispatch_failed");
        }
    }

    outcome
}

fn agent_scoped(err: &OrchError) -> bool {
    matches!(
        err,
        OrchError::HandlerFailed { .. }
            | OrchError::PipelineAborted { .. }
            | OrchError::Aggregate(_)
    )
}

fn flatten_join(
    joined: Result<Result<AgentResult, OrchError>, JoinError>,
    event: &Event,
) -> Result<AgentResult, OrchError> {
    match joined {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => Err(OrchError::HandlerPanic(AgentId::new(
            event.route().unwrap_or("unknown"),
        ))),
        Err(_) => Err(OrchError::Cancelled),
    }
}
