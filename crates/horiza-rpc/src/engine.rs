// crates/horiza-rpc/src/engine.rs
//
// Single-writer engine actor.
//
// The protocol engine is moved onto its own task and only reachable through
// an `EngineHandle`. A request is a closure over `&mut Engine`; the task runs
// closures strictly in arrival order and sends each result back on a
// oneshot channel. This serializes every mutation without any lock around
// the engine, and a closure observes exactly the state its predecessors
// left behind.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use horiza_core::{HorizaError, Result, Timestamp};
use horiza_economics::{InMemoryLedger, Protocol, ProtocolState};

/// The engine the daemon runs: protocol state over an in-memory ledger.
pub type Engine = Protocol<InMemoryLedger>;

/// Source of the current unix time in seconds.
pub type TimeSource = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Wall-clock time source.
pub fn system_time() -> TimeSource {
    Arc::new(|| chrono::Utc::now().timestamp().max(0) as Timestamp)
}

type Job = Box<dyn FnOnce(&mut Engine) + Send>;

/// Requests queued beyond this apply backpressure to callers.
const MAILBOX_CAPACITY: usize = 256;

/// Cloneable handle to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    jobs: mpsc::Sender<Job>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("closed", &self.jobs.is_closed())
            .finish()
    }
}

impl EngineHandle {
    /// Move `engine` onto a new task.
    ///
    /// The task ends once every handle is dropped and hands the engine back
    /// through the returned `JoinHandle`, so the caller can persist it.
    pub fn spawn(mut engine: Engine) -> (Self, JoinHandle<Engine>) {
        let (jobs, mut inbox) = mpsc::channel::<Job>(MAILBOX_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(job) = inbox.recv().await {
                job(&mut engine);
            }
            tracing::debug!("Engine mailbox closed");
            engine
        });
        (Self { jobs }, task)
    }

    /// Run `f` on the engine and return its output.
    ///
    /// # Errors
    /// `Io` if the engine task has stopped.
    pub async fn call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            // The caller may have gone away; nothing to do then.
            let _ = reply.send(f(engine));
        });
        self.jobs
            .send(job)
            .await
            .map_err(|_| HorizaError::Io("engine task is not running".to_string()))?;
        response
            .await
            .map_err(|_| HorizaError::Io("engine task dropped the request".to_string()))
    }

    /// Run a fallible operation on the engine.
    pub async fn execute<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.call(f).await?
    }

    /// Copy of the full engine state and ledger, for persistence.
    pub async fn export(&self) -> Result<(ProtocolState, InMemoryLedger)> {
        self.call(|engine| (engine.state().clone(), engine.ledger().clone()))
            .await
    }
}
