//! The EventEmitter protocol — how a successor event re-enters the system.

use crate::error::EmitError;
use crate::event::Event;

/// Accepts events for asynchronous processing.
///
/// The runner implements this over its bounded queue; orchestrators that
/// re-route hold an `Arc<dyn EventEmitter>` so a handler's output can spawn
/// a fresh event instead of recursing. Submission is non-blocking: a full
/// queue or a stopped runner is an error, never a silent drop.
pub trait EventEmitter: Send + Sync {
    /// Enqueue an event. Returns immediately.
    fn emit(&self, event: Event) -> Result<(), EmitError>;
}
